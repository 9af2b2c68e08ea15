use std::collections::HashMap;

use uuid::Uuid;

/// Read access to the parent links of the category forest.
pub trait ParentLinks {
	fn parent_of(&self, category_id: Uuid) -> Option<Uuid>;

	/// Number of known categories. Bounds every ancestor walk.
	fn category_count(&self) -> usize;
}
impl ParentLinks for HashMap<Uuid, Option<Uuid>> {
	fn parent_of(&self, category_id: Uuid) -> Option<Uuid> {
		self.get(&category_id).copied().flatten()
	}

	fn category_count(&self) -> usize {
		self.len()
	}
}

/// Whether making `candidate_parent_id` the parent of `category_id` closes a loop.
///
/// Walks the ancestor chain of the candidate parent. The walk takes at most one step per known
/// category; a chain that is still going after that is already looping, and is reported as a
/// cycle so nothing else gets attached to it.
pub fn would_create_cycle<L>(links: &L, category_id: Uuid, candidate_parent_id: Uuid) -> bool
where
	L: ParentLinks + ?Sized,
{
	let mut current = Some(candidate_parent_id);
	let mut remaining = links.category_count() + 1;

	while let Some(ancestor) = current {
		if ancestor == category_id {
			return true;
		}
		if remaining == 0 {
			return true;
		}

		remaining -= 1;
		current = links.parent_of(ancestor);
	}

	false
}
