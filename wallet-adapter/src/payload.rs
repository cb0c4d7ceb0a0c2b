//! Transaction payloads handed to wallets for signing.
//!
//! The encoding belongs to the chain SDK; these types only carry the JSON
//! shape wallets accept so it can cross the adapter boundary unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A transaction payload as wallets receive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionPayload {
    /// Call of an entry function.
    #[serde(rename = "entry_function_payload")]
    EntryFunction(EntryFunctionPayload),
    /// Execution of a Move script.
    #[serde(rename = "script_payload")]
    Script(ScriptPayload),
    /// Publication of a module bundle.
    #[serde(rename = "module_bundle_payload")]
    ModuleBundle(ModuleBundlePayload),
}

/// Entry function call, e.g. `0x1::coin::transfer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    /// Fully qualified function id `address::module::function`.
    pub function: String,
    /// Generic type arguments.
    #[serde(default)]
    pub type_arguments: Vec<String>,
    /// Function arguments, JSON-encoded as the node API expects.
    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// Compiled Move code, hex-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveBytecode {
    /// Hex-encoded bytecode.
    pub bytecode: String,
    /// Optional ABI description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Value>,
}

/// Move script execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptPayload {
    /// Script bytecode.
    pub code: MoveBytecode,
    /// Generic type arguments.
    #[serde(default)]
    pub type_arguments: Vec<String>,
    /// Script arguments.
    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// Module bundle publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleBundlePayload {
    /// Modules to publish.
    pub modules: Vec<MoveBytecode>,
}

/// Legacy payload shape still expected by older wallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "script_function_payload")]
pub struct ScriptFunctionPayload {
    /// Fully qualified function id.
    pub function: String,
    /// Generic type arguments.
    pub type_arguments: Vec<String>,
    /// Function arguments.
    pub arguments: Vec<Value>,
}

impl TransactionPayload {
    /// Build an entry function payload.
    #[must_use]
    pub fn entry_function(
        function: impl Into<String>,
        type_arguments: Vec<String>,
        arguments: Vec<Value>,
    ) -> Self {
        Self::EntryFunction(EntryFunctionPayload {
            function: function.into(),
            type_arguments,
            arguments,
        })
    }

    /// Convert to the legacy `script_function_payload` shape.
    ///
    /// Only entry function payloads have a legacy equivalent.
    #[must_use]
    pub fn to_legacy(&self) -> Option<ScriptFunctionPayload> {
        match self {
            Self::EntryFunction(payload) => Some(payload_v1_to_v0(payload)),
            Self::Script(_) | Self::ModuleBundle(_) => None,
        }
    }
}

/// Rewrite an entry function payload into the legacy script function shape.
#[must_use]
pub fn payload_v1_to_v0(payload: &EntryFunctionPayload) -> ScriptFunctionPayload {
    ScriptFunctionPayload {
        function: payload.function.clone(),
        type_arguments: payload.type_arguments.clone(),
        arguments: payload.arguments.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transfer() -> TransactionPayload {
        TransactionPayload::entry_function(
            "0x1::coin::transfer",
            vec!["0x1::aptos_coin::AptosCoin".into()],
            vec![json!("0x2"), json!("100")],
        )
    }

    #[test]
    fn entry_function_is_tagged_for_wallets() {
        let value = serde_json::to_value(transfer()).unwrap();
        assert_eq!(value["type"], "entry_function_payload");
        assert_eq!(value["function"], "0x1::coin::transfer");
        assert_eq!(value["arguments"][1], "100");
    }

    #[test]
    fn parses_wallet_json() {
        let payload: TransactionPayload = serde_json::from_value(json!({
            "type": "script_payload",
            "code": { "bytecode": "0xa11ceb0b" },
            "type_arguments": [],
            "arguments": [1]
        }))
        .unwrap();
        assert!(matches!(payload, TransactionPayload::Script(ref s) if s.code.bytecode == "0xa11ceb0b"));
        assert!(payload.to_legacy().is_none());
    }

    #[test]
    fn legacy_conversion_keeps_call_data() {
        let legacy = transfer().to_legacy().unwrap();
        let value = serde_json::to_value(&legacy).unwrap();
        assert_eq!(value["type"], "script_function_payload");
        assert_eq!(value["function"], "0x1::coin::transfer");
        assert_eq!(value["type_arguments"][0], "0x1::aptos_coin::AptosCoin");
        assert_eq!(value["arguments"], json!(["0x2", "100"]));
    }
}
