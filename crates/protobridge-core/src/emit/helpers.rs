//! Utility-demand tracking.
//!
//! Generators record which shared runtime helpers their output refers to;
//! the assembler materializes exactly the recorded bodies once per output
//! file. Recording is idempotent and the drain order is fixed, so output
//! is byte-stable across runs.

use std::collections::BTreeSet;

/// Shared runtime helpers the generated code may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuntimeHelper {
    BytesFromBase64,
    Base64FromBytes,
    LongToString,
    LongToNumber,
    LongToBigint,
    ToTimestamp,
    FromTimestamp,
    FromJsonTimestamp,
    FromJsonObjectId,
    FromProtoObjectId,
    ToProtoObjectId,
    IsSet,
    IsObject,
    DeepPartial,
}

impl RuntimeHelper {
    /// Every helper, in emission order.
    pub const ALL: [Self; 14] = [
        Self::BytesFromBase64,
        Self::Base64FromBytes,
        Self::LongToString,
        Self::LongToNumber,
        Self::LongToBigint,
        Self::ToTimestamp,
        Self::FromTimestamp,
        Self::FromJsonTimestamp,
        Self::FromJsonObjectId,
        Self::FromProtoObjectId,
        Self::ToProtoObjectId,
        Self::IsSet,
        Self::IsObject,
        Self::DeepPartial,
    ];

    /// The identifier generated code uses to call this helper.
    pub const fn ident(self) -> &'static str {
        match self {
            Self::BytesFromBase64 => "bytesFromBase64",
            Self::Base64FromBytes => "base64FromBytes",
            Self::LongToString => "longToString",
            Self::LongToNumber => "longToNumber",
            Self::LongToBigint => "longToBigint",
            Self::ToTimestamp => "toTimestamp",
            Self::FromTimestamp => "fromTimestamp",
            Self::FromJsonTimestamp => "fromJsonTimestamp",
            Self::FromJsonObjectId => "fromJsonObjectId",
            Self::FromProtoObjectId => "fromProtoObjectId",
            Self::ToProtoObjectId => "toProtoObjectId",
            Self::IsSet => "isSet",
            Self::IsObject => "isObject",
            Self::DeepPartial => "DeepPartial",
        }
    }

    /// Whether this helper's body refers to the `Long` runtime class.
    pub const fn needs_long(self) -> bool {
        matches!(
            self,
            Self::LongToString | Self::LongToNumber | Self::LongToBigint
        )
    }

    /// Whether this helper's body refers to the structured identifier
    /// runtime.
    pub const fn needs_object_id_runtime(self) -> bool {
        matches!(
            self,
            Self::FromJsonObjectId | Self::FromProtoObjectId | Self::ToProtoObjectId
        )
    }
}

/// Per-file mark-and-collect set of demanded helpers.
#[derive(Debug, Default, Clone)]
pub struct HelperSet {
    needed: BTreeSet<RuntimeHelper>,
}

impl HelperSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that generated code references `helper` and return its
    /// identifier for splicing into the output.
    pub fn demand(&mut self, helper: RuntimeHelper) -> &'static str {
        self.needed.insert(helper);
        helper.ident()
    }

    pub fn contains(&self, helper: RuntimeHelper) -> bool {
        self.needed.contains(&helper)
    }

    pub fn is_empty(&self) -> bool {
        self.needed.is_empty()
    }

    /// The demanded helpers in emission order.
    pub fn collect(&self) -> Vec<RuntimeHelper> {
        RuntimeHelper::ALL
            .iter()
            .copied()
            .filter(|h| self.needed.contains(h))
            .collect()
    }
}
