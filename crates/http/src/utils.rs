//! Helpers shared by the tokenizer and the request buffer.

/// Returns `Err($error)` from the enclosing function unless `$predicate` holds.
/// Used for bound checks on bytes read from a peer.
///
/// ```ignore
/// ensure!(path.len() <= limits.max_path_len, ParseError::too_long_path(path.len(), limits.max_path_len));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
