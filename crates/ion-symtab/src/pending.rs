//! Symbol tables a reader passed since the last user value.

use crate::symbols::SymbolTable;

const INITIAL_CAPACITY: usize = 3;

/// LIFO stack of tables encountered between two top-level user values.
///
/// Cleared at the start of every top-level `next()`; popping yields the most
/// recent table first.
#[derive(Debug, Clone)]
pub struct PendingTableStack {
    tables: Vec<SymbolTable>,
}

impl Default for PendingTableStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingTableStack {
    pub fn new() -> Self {
        Self {
            tables: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn push(&mut self, table: SymbolTable) {
        self.tables.push(table);
    }

    pub fn pop(&mut self) -> Option<SymbolTable> {
        self.tables.pop()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::LocalSymbolTable;

    #[test]
    fn pops_most_recent_first_and_grows() {
        let mut stack = PendingTableStack::new();
        let local = SymbolTable::local(LocalSymbolTable::system());
        stack.push(SymbolTable::system());
        stack.push(local.clone());
        for _ in 0..4 {
            stack.push(SymbolTable::system());
        }
        assert_eq!(stack.len(), 6);
        for _ in 0..4 {
            assert!(stack.pop().unwrap().is_system());
        }
        assert!(stack.pop().unwrap().same_table(&local));
        assert!(stack.pop().unwrap().is_system());
        assert!(stack.pop().is_none());
        stack.push(local);
        stack.clear();
        assert!(stack.is_empty());
    }
}
