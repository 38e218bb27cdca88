use super::*;
use common::shapes::Vec2;

impl Quadtree {
    /// Objects whose circle touches the query circle, filtered by `options`.
    pub fn find_nearby(&self, options: &SearchOptions<'_>) -> SpatialResult<Vec<ObjectId>> {
        options.validate()?;
        let query_box = options.query_box(&self.world);
        let mut found = Vec::new();

        // Descend to the smallest node enclosing the query box. Straddlers
        // stored on the way down can still overlap the query.
        let mut node = ROOT;
        loop {
            let current = self.node(node);
            let Some(children) = current.children() else {
                break;
            };
            let Some(quadrant) = current.cell.pick_sub_quadrant(&query_box) else {
                break;
            };
            gather(current, options, &query_box, &mut found);
            if options.is_full(found.len()) {
                return Ok(options.finish(found));
            }
            node = children[quadrant];
        }

        let mut stack: SmallVec<[u32; 64]> = smallvec![node];
        while let Some(index) = stack.pop() {
            let current = self.node(index);
            gather(current, options, &query_box, &mut found);
            if options.is_full(found.len()) {
                break;
            }
            if let Some(children) = current.children() {
                for child in children.into_iter().rev() {
                    if self.node(child).cell.bounds.overlaps(&query_box) {
                        stack.push(child);
                    }
                }
            }
        }
        Ok(options.finish(found))
    }
}

fn gather(
    node: &QuadNode,
    options: &SearchOptions<'_>,
    query_box: &Aabb,
    found: &mut Vec<(ObjectId, Vec2)>,
) {
    for item in &node.items {
        if options.is_full(found.len()) {
            return;
        }
        if options.accepts(
            query_box,
            item.id,
            item.kind,
            item.loyalty,
            &item.bounds,
            item.center,
            item.radius,
        ) {
            found.push((item.id, item.center));
        }
    }
}
