use cobble_util::{
    octree::{LeafSet, Octree},
    Aabb,
};

/// Handle into the entity arena. The octree stores these instead of
/// pointers; the arena owns the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u32);

#[derive(Debug)]
struct Record {
    aabb: Aabb,
    /// Leaves currently holding this entity, for precise removal.
    leaves: LeafSet,
}

/// Entities resident in the world window: a slot arena plus the octree
/// broad-phase index over their bounding boxes.
pub struct EntityStore {
    records: Vec<Option<Record>>,
    free: Vec<u32>,
    octree: Octree<EntityId>,
}

impl EntityStore {
    /// `span` is the side of the indexed cube, matching the frame's full
    /// block extent.
    pub fn new(span: u32) -> Self {
        Self {
            records: Vec::new(),
            free: Vec::new(),
            octree: Octree::new(span),
        }
    }

    pub fn spawn(&mut self, aabb: Aabb) -> EntityId {
        let leaves = LeafSet::new();
        let id = match self.free.pop() {
            Some(slot) => {
                self.records[slot as usize] = Some(Record { aabb, leaves });
                EntityId(slot)
            }
            None => {
                self.records.push(Some(Record { aabb, leaves }));
                EntityId(self.records.len() as u32 - 1)
            }
        };
        let placed = self.octree.insert(id, &aabb);
        if let Some(record) = &mut self.records[id.0 as usize] {
            record.leaves = placed;
        }
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Aabb> {
        let record = self.records.get_mut(id.0 as usize)?.take()?;
        self.octree.remove_from(id, &record.leaves);
        self.free.push(id.0);
        Some(record.aabb)
    }

    /// Reindexes a moved entity: precise removal from its old leaves, then
    /// reinsertion at the new box.
    pub fn relocate(&mut self, id: EntityId, aabb: Aabb) -> bool {
        let Some(Some(record)) = self.records.get_mut(id.0 as usize) else {
            return false;
        };
        let old_leaves = std::mem::take(&mut record.leaves);
        record.aabb = aabb;
        self.octree.remove_from(id, &old_leaves);
        let placed = self.octree.insert(id, &aabb);
        if let Some(Some(record)) = self.records.get_mut(id.0 as usize) {
            record.leaves = placed;
        }
        true
    }

    pub fn aabb(&self, id: EntityId) -> Option<&Aabb> {
        self.records
            .get(id.0 as usize)?
            .as_ref()
            .map(|record| &record.aabb)
    }

    /// Entities whose indexed leaves overlap `aabb`, deduplicated. A
    /// broad-phase result: callers wanting exact overlap re-test the boxes.
    pub fn query(&self, aabb: &Aabb, out: &mut Vec<EntityId>) {
        out.clear();
        self.octree.query_dedup(aabb, out);
    }

    pub fn len(&self) -> usize {
        self.records.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{vec3, Vec3};

    fn small_box(center: Vec3) -> Aabb {
        Aabb::from_center_size(center, Vec3::splat(1.0))
    }

    #[test]
    fn spawned_entities_are_found_by_overlap_query() {
        let mut store = EntityStore::new(64);
        let a = store.spawn(small_box(vec3(10.0, 10.0, 10.0)));
        let b = store.spawn(small_box(vec3(-10.0, -10.0, -10.0)));

        let mut hits = Vec::new();
        store.query(&small_box(vec3(10.0, 10.0, 10.0)), &mut hits);
        assert_eq!(hits, vec![a]);

        store.query(&small_box(vec3(-10.0, -10.0, -10.0)), &mut hits);
        assert_eq!(hits, vec![b]);
    }

    #[test]
    fn despawn_removes_from_the_index_and_recycles_the_slot() {
        let mut store = EntityStore::new(64);
        let a = store.spawn(small_box(vec3(5.0, 5.0, 5.0)));
        assert!(store.despawn(a).is_some());
        assert!(store.despawn(a).is_none());
        assert!(store.is_empty());

        let mut hits = Vec::new();
        store.query(&small_box(vec3(5.0, 5.0, 5.0)), &mut hits);
        assert!(hits.is_empty());

        // Recycled slot, same index, fresh record.
        let b = store.spawn(small_box(vec3(1.0, 1.0, 1.0)));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn relocation_moves_the_index_entry() {
        let mut store = EntityStore::new(64);
        let id = store.spawn(small_box(vec3(10.0, 10.0, 10.0)));
        assert!(store.relocate(id, small_box(vec3(-10.0, 10.0, 10.0))));

        let mut hits = Vec::new();
        store.query(&small_box(vec3(10.0, 10.0, 10.0)), &mut hits);
        assert!(hits.is_empty());

        store.query(&small_box(vec3(-10.0, 10.0, 10.0)), &mut hits);
        assert_eq!(hits, vec![id]);
        assert_eq!(store.aabb(id).unwrap().center(), vec3(-10.0, 10.0, 10.0));
    }

    #[test]
    fn boundary_straddling_entity_is_reported_once() {
        let mut store = EntityStore::new(64);
        let id = store.spawn(small_box(Vec3::ZERO));

        let mut hits = Vec::new();
        store.query(&small_box(Vec3::ZERO), &mut hits);
        assert_eq!(hits, vec![id]);
    }
}
