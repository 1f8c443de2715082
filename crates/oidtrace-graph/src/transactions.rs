//! Windows over a store's transaction log.

use oidtrace_store::Transaction;

/// Transactions `[start, start + count)` counted from the most recent one
/// (index 0), each tagged with that newest-first index.
///
/// `transactions` is the log oldest first, as the store returns it. A window
/// running past the oldest transaction is cut short.
pub fn recent_transactions(
    transactions: &[Transaction],
    start: usize,
    count: usize,
) -> Vec<(usize, &Transaction)> {
    transactions
        .iter()
        .rev()
        .enumerate()
        .skip(start)
        .take(count)
        .collect()
}
