use std::collections::VecDeque;

use super::item::SendItem;

/// FIFO of outbound items, consumed strictly head-first.
///
/// Owns its items: dropping the queue drops every remaining item without
/// flushing their access logs.
#[derive(Debug, Default)]
pub struct SendQueue {
	items: VecDeque<SendItem>,
}

impl SendQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, item: SendItem) {
		self.items.push_back(item);
	}

	pub fn front(&self) -> Option<&SendItem> {
		self.items.front()
	}

	pub(crate) fn front_mut(&mut self) -> Option<&mut SendItem> {
		self.items.front_mut()
	}

	pub(crate) fn pop(&mut self) -> Option<SendItem> {
		self.items.pop_front()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &SendItem> {
		self.items.iter()
	}
}
