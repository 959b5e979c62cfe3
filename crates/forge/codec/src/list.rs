//! Singly-linked list codec

use serde_json::Value;

/// A singly-linked list node
#[derive(Debug)]
pub struct ListNode {
    pub val: Value,
    pub next: Option<Box<ListNode>>,
}

impl ListNode {
    pub fn new(val: impl Into<Value>) -> Self {
        Self {
            val: val.into(),
            next: None,
        }
    }

    /// Iterate over the values from this node to the tail
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { node: Some(self) }
    }

    /// Number of nodes from this node to the tail
    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

// Long chains would overflow the stack with the derived recursive drop
// and comparison, so both walk the chain iteratively.
impl Drop for ListNode {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

impl PartialEq for ListNode {
    fn eq(&self, other: &Self) -> bool {
        let mut a = self.iter();
        let mut b = other.iter();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) if x == y => continue,
                _ => return false,
            }
        }
    }
}

/// Iterator over list values
pub struct ListIter<'a> {
    node: Option<&'a ListNode>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.next.as_deref();
        Some(&node.val)
    }
}

/// `[a, b, c]` → `a → b → c`; an empty array yields no list
pub fn array_to_list(values: &[Value]) -> Option<Box<ListNode>> {
    let mut head: Option<Box<ListNode>> = None;
    for val in values.iter().rev() {
        head = Some(Box::new(ListNode {
            val: val.clone(),
            next: head,
        }));
    }
    head
}

/// `a → b → c` → `[a, b, c]`; no list yields an empty array
pub fn list_to_array(head: Option<&ListNode>) -> Vec<Value> {
    head.map(|node| node.iter().cloned().collect())
        .unwrap_or_default()
}
