//! Inbound relay request parsing and validation.

use crate::Error;
use alloy::primitives::{Address, Bytes};
use serde_json::Value;

pub const MISSING_FIELDS: &str = "Missing required fields";

/// A validated `POST /relay` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub paymaster: Address,
    pub target: Address,
    pub encoded_data: Bytes,
    pub gas_limit: u64,
    pub user: Address,
}

impl RelayRequest {
    /// Validate a JSON body. `data` is accepted in place of `encodedData`.
    /// Rejected wholesale on any missing or malformed field.
    pub fn from_json(body: &Value) -> Result<Self, Error> {
        let obj = body
            .as_object()
            .ok_or_else(|| Error::InvalidRequest("Request must be a JSON object".into()))?;

        let field = |name: &str| obj.get(name).filter(|v| !v.is_null());
        let encoded = field("encodedData").or_else(|| field("data"));

        let (Some(paymaster), Some(target), Some(encoded), Some(gas_limit), Some(user)) = (
            field("paymaster"),
            field("target"),
            encoded,
            field("gasLimit"),
            field("user"),
        ) else {
            return Err(Error::InvalidRequest(MISSING_FIELDS.into()));
        };

        Ok(Self {
            paymaster: parse_address("paymaster", paymaster)?,
            target: parse_address("target", target)?,
            encoded_data: parse_hex("encodedData", encoded)?,
            gas_limit: parse_gas_limit(gas_limit)?,
            user: parse_address("user", user)?,
        })
    }
}

fn as_prefixed_str<'a>(name: &str, value: &'a Value) -> Result<&'a str, Error> {
    let s = value
        .as_str()
        .ok_or_else(|| Error::InvalidRequest(format!("Invalid {name}: expected a string")))?;
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| Error::InvalidRequest(format!("Invalid {name}: missing 0x prefix")))
}

fn parse_address(name: &str, value: &Value) -> Result<Address, Error> {
    let hex = as_prefixed_str(name, value)?;
    if hex.len() != 40 {
        return Err(Error::InvalidRequest(format!(
            "Invalid {name}: expected 20-byte address"
        )));
    }
    hex.parse::<Address>()
        .map_err(|_| Error::InvalidRequest(format!("Invalid {name}: not a hex address")))
}

fn parse_hex(name: &str, value: &Value) -> Result<Bytes, Error> {
    let hex = as_prefixed_str(name, value)?;
    alloy::hex::decode(hex)
        .map(Bytes::from)
        .map_err(|_| Error::InvalidRequest(format!("Invalid {name}: malformed hex")))
}

fn parse_gas_limit(value: &Value) -> Result<u64, Error> {
    match value.as_u64() {
        Some(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidRequest(
            "Invalid gasLimit: expected a positive integer".into(),
        )),
    }
}
