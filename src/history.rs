use std::collections::VecDeque;

/// Undo/redo buffer holding at most `N` states. It is seeded with one
/// state and can never become empty.
#[derive(Clone, Debug)]
pub struct BoundedHistory<T, const N: usize> {
    data: VecDeque<T>,
    index: usize, // Points at the state currently shown
}

impl<T, const N: usize> BoundedHistory<T, N> {
    const NON_ZERO_CAPACITY: () = assert!(N > 0, "history capacity must be at least 1");

    pub fn new(seed: T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_ZERO_CAPACITY;

        let mut data = VecDeque::with_capacity(N);
        data.push_back(seed);
        Self { data, index: 0 }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &T {
        &self.data[self.index]
    }

    /// The most recently appended state, regardless of the cursor.
    pub fn back(&self) -> &T {
        &self.data[self.data.len() - 1]
    }

    pub fn undo(&mut self) -> &T {
        if self.index > 0 {
            self.index -= 1;
        }
        &self.data[self.index]
    }

    pub fn redo(&mut self) -> &T {
        if self.index + 1 < self.data.len() {
            self.index += 1;
        }
        &self.data[self.index]
    }

    pub fn append(&mut self, value: T) {
        if self.index == N - 1 {
            self.data.pop_front();
        } else if self.index + 1 < self.data.len() {
            // Appending after an undo drops the abandoned future
            self.index += 1;
            self.data.truncate(self.index);
        } else {
            self.index += 1;
        }
        self.data.push_back(value);
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.data.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}
