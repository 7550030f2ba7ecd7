//! Player name assignment.
//!
//! A session names each player once, when it admits the connection. The
//! strategy is pluggable; [`SequentialNames`] gives `Player 1`,
//! `Player 2`, ….

/// Picks a display name for the `n`-th seat (1-based).
///
/// The session skips forward to `n + 1`, `n + 2`, … if the name returned
/// is already taken, so an implementation need not track what it handed
/// out. Any `Fn(usize) -> String` works as an assigner.
pub trait NameAssigner: Send + Sync + 'static {
    fn name_for(&self, n: usize) -> String;
}

/// `Player 1`, `Player 2`, ….
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialNames;

impl NameAssigner for SequentialNames {
    fn name_for(&self, n: usize) -> String {
        format!("Player {n}")
    }
}

impl<F> NameAssigner for F
where
    F: Fn(usize) -> String + Send + Sync + 'static,
{
    fn name_for(&self, n: usize) -> String {
        self(n)
    }
}

/// First name from `assigner`, starting at seat `n`, that `taken` rejects.
///
/// Tries `taken.len() + 1` seats, enough for any assigner that gives
/// distinct seats distinct names. Falls back to suffixing `#n` when the
/// assigner repeats itself.
pub(crate) fn unique_name(assigner: &dyn NameAssigner, n: usize, taken: &[&str]) -> String {
    for seat in n..=n + taken.len() {
        let name = assigner.name_for(seat);
        if !taken.contains(&name.as_str()) {
            return name;
        }
    }
    let mut seat = n;
    loop {
        let name = format!("{} #{seat}", assigner.name_for(n));
        if !taken.contains(&name.as_str()) {
            return name;
        }
        seat += 1;
    }
}
