//! Separates genuine cross-contract calls from noise in the call expressions recorded
//! by the analyzer.
//!
//! The filter is textual: an expression is dropped when it contains a built-in
//! accessor/cast token or the name of a library the contract calls. A library name
//! mentioned anywhere in the expression, string literals included, is enough.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// Tokens marking value/sender accessors, object construction, self calls, casts and
/// ABI helpers.
pub const EXCEPTIONS: [&str; 6] = ["msg.value", "msg.sender", "new ", "this.", "address(", "abi."];

static LEADING_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)").expect("valid identifier regex"));

static RECEIVER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\.").expect("valid receiver regex"));

/// Library names are the leading identifier of each library call expression,
/// `SafeERC20.safeTransfer(...)` yields `SafeERC20`.
pub fn extract_library_names<S: AsRef<str>>(library_calls: &[S]) -> HashSet<String> {
    library_calls
        .iter()
        .filter_map(|call| LEADING_IDENTIFIER.captures(call.as_ref()))
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Exclusion set: the fixed exception tokens plus the given library names.
pub fn exclusions(library_names: &HashSet<String>) -> HashSet<String> {
    EXCEPTIONS
        .iter()
        .map(|token| token.to_string())
        .chain(library_names.iter().cloned())
        .collect()
}

pub fn contains_exclusions(call: &str, exclusions: &HashSet<String>) -> bool {
    exclusions.iter().any(|exclusion| call.contains(exclusion.as_str()))
}

/// Keeps the calls that mention neither an exception token nor a library name.
/// Input order is preserved and duplicates are kept.
pub fn filter_external_calls<S: AsRef<str>>(
    all_external_calls: &[S],
    library_names: &HashSet<String>,
) -> Vec<String> {
    let exclusions = exclusions(library_names);
    let mut external_calls = Vec::with_capacity(all_external_calls.len());
    for call in all_external_calls {
        let call: &str = call.as_ref();
        if !contains_exclusions(call, &exclusions) {
            external_calls.push(call.to_string());
        }
    }
    external_calls
}

/// Receiver identifiers of the given calls, `token.transfer(...)` yields `token`.
pub fn external_interfaces<S: AsRef<str>>(external_calls: &[S]) -> BTreeSet<String> {
    external_calls
        .iter()
        .filter_map(|call| RECEIVER.captures(call.as_ref()))
        .map(|captures| captures[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_library_names() {
        let calls = [
            "SafeERC20.safeTransfer(token,to,amount)",
            "SafeERC20.safeApprove(token,spender,0)",
            "Math.max(a,b)",
            "  leading whitespace is not an identifier",
        ];
        let names = extract_library_names(&calls);
        assert_eq!(
            names,
            HashSet::from(["SafeERC20".to_string(), "Math".to_string()])
        );
    }

    #[test]
    fn test_extract_library_names_is_idempotent() {
        let calls = ["Address.functionCall(target,data)", "Strings.toString(id)"];
        assert_eq!(extract_library_names(&calls), extract_library_names(&calls));

        let names = extract_library_names(&calls);
        let fixed: HashSet<String> = EXCEPTIONS.iter().map(|t| t.to_string()).collect();
        let left: HashSet<String> = names.union(&fixed).cloned().collect();
        let right: HashSet<String> = fixed.union(&names).cloned().collect();
        assert_eq!(left, right);
        assert_eq!(exclusions(&names), left);
    }

    #[test]
    fn test_exception_tokens_always_filtered() {
        let calls = [
            "recipient.call{value: msg.value}()",
            "registry.register(msg.sender)",
            "new Pair()",
            "this.execute(data)",
            "IERC20(address(token)).transfer(to,1)",
            "target.call(abi.encodeWithSelector(sel))",
        ];
        for library_names in [
            HashSet::new(),
            HashSet::from(["Unrelated".to_string()]),
        ] {
            assert!(filter_external_calls(&calls, &library_names).is_empty());
        }
    }

    #[test]
    fn test_filter_keeps_order_and_duplicates() {
        let calls = [
            "oracle.latestAnswer()",
            "SafeMath.add(a,b)",
            "token.transfer(to,amount)",
            "oracle.latestAnswer()",
        ];
        let library_names = extract_library_names(&["SafeMath.sub(a,b)"]);
        assert_eq!(
            filter_external_calls(&calls, &library_names),
            vec![
                "oracle.latestAnswer()",
                "token.transfer(to,amount)",
                "oracle.latestAnswer()",
            ]
        );
    }

    #[test]
    fn test_library_name_matches_as_substring() {
        // A library name inside any part of the expression excludes it.
        let calls = ["vault.deposit(SafeERC20Wrapper)", "vault.withdraw(1)"];
        let library_names = HashSet::from(["SafeERC20".to_string()]);
        assert_eq!(
            filter_external_calls(&calls, &library_names),
            vec!["vault.withdraw(1)"]
        );
    }

    #[test]
    fn test_external_interfaces() {
        let calls = [
            "token.transfer(to,amount)",
            "oracle.latestAnswer()",
            "token.balanceOf(user)",
            "noReceiver()",
        ];
        assert_eq!(
            external_interfaces(&calls),
            BTreeSet::from(["oracle".to_string(), "token".to_string()])
        );
    }
}
