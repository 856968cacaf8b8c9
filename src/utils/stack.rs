// A growable stack whose entries stay addressable by index, so the inline
// parser can mark and skip entries below the top without shifting anything.
pub(crate) struct Stack<T> {
    buff: Vec<T>,
}

impl<T> Stack<T> {
    pub(crate) fn new() -> Self {
        Stack { buff: vec![] }
    }

    pub(crate) fn push(&mut self, e: T) {
        self.buff.push(e)
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        self.buff.pop()
    }

    pub(crate) fn last(&self) -> Option<&T> {
        self.buff.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.buff.len()
    }

    pub(crate) fn get(&self, ix: usize) -> Option<&T> {
        self.buff.get(ix)
    }

    pub(crate) fn get_mut(&mut self, ix: usize) -> Option<&mut T> {
        self.buff.get_mut(ix)
    }

    // Drop every entry at or above `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.buff.truncate(len)
    }

    // Apply `f` to each entry matching the predicate.
    pub(crate) fn update_where<P, F>(&mut self, p: P, mut f: F)
    where
        P: Fn(&T) -> bool,
        F: FnMut(&mut T),
    {
        self.buff.iter_mut().filter(|e| p(&**e)).for_each(|e| f(e));
    }
}
