// renderer/stack.rs
use super::error::{RenderError, Result, StackKind};

/// A stack with a hard depth limit. Failed pushes and pops leave the
/// contents untouched.
#[derive(Debug, Clone)]
pub struct BoundedStack<T> {
    kind: StackKind,
    max_depth: usize,
    items: Vec<T>,
}

impl<T> BoundedStack<T> {
    pub fn new(kind: StackKind, max_depth: usize) -> Self {
        Self {
            kind,
            max_depth,
            items: Vec::with_capacity(max_depth.min(64)),
        }
    }

    pub fn push(&mut self, item: T) -> Result<()> {
        if self.items.len() >= self.max_depth {
            return Err(RenderError::StackOverflow {
                stack: self.kind,
                depth: self.max_depth,
            });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<T> {
        self.items
            .pop()
            .ok_or(RenderError::StackUnderflow { stack: self.kind })
    }

    pub fn top(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut T> {
        self.items.last_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn kind(&self) -> StackKind {
        self.kind
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_past_limit_fails_without_changing_contents() {
        let mut stack = BoundedStack::new(StackKind::Color, 2);
        stack.push(1).unwrap();
        stack.push(2).unwrap();

        let err = stack.push(3).unwrap_err();
        assert_eq!(
            err,
            RenderError::StackOverflow {
                stack: StackKind::Color,
                depth: 2
            }
        );
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top(), Some(&2));
    }

    #[test]
    fn pop_on_empty_is_underflow() {
        let mut stack: BoundedStack<u8> = BoundedStack::new(StackKind::Texture, 4);
        assert_eq!(
            stack.pop(),
            Err(RenderError::StackUnderflow {
                stack: StackKind::Texture
            })
        );
        assert!(stack.is_empty());
    }
}
