//! Gateway parameter sets and field names.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Field names used by the VNPAY protocol.
pub mod fields {
    pub const VERSION: &str = "vnp_Version";
    pub const COMMAND: &str = "vnp_Command";
    pub const TMN_CODE: &str = "vnp_TmnCode";
    pub const AMOUNT: &str = "vnp_Amount";
    pub const CURR_CODE: &str = "vnp_CurrCode";
    pub const LOCALE: &str = "vnp_Locale";
    pub const RETURN_URL: &str = "vnp_ReturnUrl";
    pub const TXN_REF: &str = "vnp_TxnRef";
    pub const ORDER_INFO: &str = "vnp_OrderInfo";
    pub const ORDER_TYPE: &str = "vnp_OrderType";
    pub const IP_ADDR: &str = "vnp_IpAddr";
    pub const BANK_CODE: &str = "vnp_BankCode";
    pub const CREATE_DATE: &str = "vnp_CreateDate";
    pub const EXPIRE_DATE: &str = "vnp_ExpireDate";
    pub const SECURE_HASH: &str = "vnp_SecureHash";
    pub const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
    pub const RESPONSE_CODE: &str = "vnp_ResponseCode";
    pub const TRANSACTION_NO: &str = "vnp_TransactionNo";
    pub const TRANSACTION_STATUS: &str = "vnp_TransactionStatus";
    pub const PAY_DATE: &str = "vnp_PayDate";
    pub const BANK_TRAN_NO: &str = "vnp_BankTranNo";
    pub const CARD_TYPE: &str = "vnp_CardType";
    pub const REQUEST_ID: &str = "vnp_RequestId";
    pub const TRANSACTION_DATE: &str = "vnp_TransactionDate";
    pub const TRANSACTION_TYPE: &str = "vnp_TransactionType";
    pub const CREATE_BY: &str = "vnp_CreateBy";
    pub const MESSAGE: &str = "vnp_Message";
}

/// Protocol version sent with every request.
pub const PROTOCOL_VERSION: &str = "2.1.0";

/// Command for a new payment.
pub const COMMAND_PAY: &str = "pay";

/// Response code the gateway uses for a successful transaction.
pub const SUCCESS_CODE: &str = "00";

/// The gateway expects amounts multiplied by this factor.
pub const AMOUNT_SCALE: i64 = 100;

/// Fields that carry the signature itself and are never signed.
pub const SIGNATURE_FIELDS: [&str; 2] = [fields::SECURE_HASH, fields::SECURE_HASH_TYPE];

/// A set of gateway parameters, keyed by field name.
///
/// Keys are kept in byte-wise ascending order, so iteration order never
/// depends on how the set was built. Empty values are treated as absent:
/// inserting one removes the field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, String>);

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set a field, replacing any previous value. An empty value removes it.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            self.0.remove(&name);
        } else {
            self.0.insert(name, value);
        }
    }

    /// Set a field only when a value is present.
    pub fn insert_opt(&mut self, name: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// Returns true if the field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields in byte-wise ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a raw query string. A leading `?` is ignored; any other `?`
    /// belongs to a value.
    ///
    /// `+` decodes to a space and `%XX` escapes are resolved. Invalid UTF-8
    /// is replaced rather than rejected. A repeated field keeps its last value.
    ///
    /// ```
    /// use vnpay_lib::ParameterSet;
    ///
    /// let params = ParameterSet::from_query("vnp_TxnRef=A1&vnp_OrderInfo=Thanh+toan%20don?");
    /// assert_eq!(params.get("vnp_TxnRef"), Some("A1"));
    /// assert_eq!(params.get("vnp_OrderInfo"), Some("Thanh toan don?"));
    /// ```
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut params = Self::new();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.insert(decode_component(name), decode_component(value));
        }
        params
    }

    /// Parse the query of a full URL, dropping any fragment. A URL without a
    /// query yields an empty set.
    pub fn from_url(url: &str) -> Self {
        match url.split_once('?') {
            Some((_, rest)) => {
                let query = rest.split('#').next().unwrap_or_default();
                Self::from_query(query)
            }
            None => Self::new(),
        }
    }

    /// Parse either a URL (absolute, or a path starting with `/`) or a bare
    /// query string.
    ///
    /// ```
    /// use vnpay_lib::ParameterSet;
    ///
    /// let from_url = ParameterSet::parse("https://shop.example/return?vnp_TxnRef=A1");
    /// let from_path = ParameterSet::parse("/return?vnp_TxnRef=A1");
    /// let from_query = ParameterSet::parse("vnp_TxnRef=A1");
    /// assert_eq!(from_url, from_query);
    /// assert_eq!(from_path, from_query);
    /// ```
    pub fn parse(input: &str) -> Self {
        if input.contains("://") || input.starts_with('/') {
            Self::from_url(input)
        } else {
            Self::from_query(input)
        }
    }
}

fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            let bytes = urlencoding::decode_binary(plus_decoded.as_bytes());
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<K, V> Extend<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ParameterSet {
    /// Renders names only; values may carry customer data.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value_is_absent() {
        let mut params = ParameterSet::new();
        params.insert("vnp_BankCode", "NCB");
        params.insert("vnp_BankCode", "");
        assert!(!params.contains("vnp_BankCode"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_iteration_is_byte_ordered() {
        let params: ParameterSet = [("b", "2"), ("B", "3"), ("a", "1"), ("_", "4")]
            .into_iter()
            .collect();
        let names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["B", "_", "a", "b"]);
    }

    #[test]
    fn test_from_query_decodes_plus_and_percent() {
        let params = ParameterSet::from_query("a=1+2&b=%C4%90%C6%A1n&c=x%2By&d=");
        assert_eq!(params.get("a"), Some("1 2"));
        assert_eq!(params.get("b"), Some("Đơn"));
        assert_eq!(params.get("c"), Some("x+y"));
        assert_eq!(params.get("d"), None);
    }

    #[test]
    fn test_from_url_strips_fragment_and_keeps_last() {
        let params = ParameterSet::from_url("https://x.test/return?k=v&k=w#frag");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("k"), Some("w"));
    }

    #[test]
    fn test_raw_question_mark_stays_in_value() {
        let params = ParameterSet::from_query("vnp_OrderInfo=what?x&vnp_TxnRef=A1");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("vnp_OrderInfo"), Some("what?x"));
        assert_eq!(params.get("vnp_TxnRef"), Some("A1"));

        let params = ParameterSet::parse("https://x.test/return?vnp_OrderInfo=what?x&vnp_TxnRef=A1");
        assert_eq!(params.get("vnp_OrderInfo"), Some("what?x"));
        assert_eq!(ParameterSet::from_query("?vnp_TxnRef=A1").get("vnp_TxnRef"), Some("A1"));
    }

    #[test]
    fn test_from_url_without_query() {
        assert!(ParameterSet::from_url("https://x.test/return").is_empty());
        let params = ParameterSet::from_url("https://x.test/return?vnp_TxnRef=A1");
        assert_eq!(params.get("vnp_TxnRef"), Some("A1"));
    }

    #[test]
    fn test_from_query_tolerates_invalid_utf8() {
        let params = ParameterSet::from_query("k=%FF%FE");
        assert!(params.get("k").is_some());
    }

    #[test]
    fn test_display_hides_values() {
        let params: ParameterSet = [("vnp_TxnRef", "secret-ish")].into_iter().collect();
        assert_eq!(params.to_string(), "[vnp_TxnRef]");
    }
}
