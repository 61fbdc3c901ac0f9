//! Absorption of preceding siblings by repeaters and merge-paths.
//!
//! Runs once per group, after its children exist. The first phase plans every
//! absorption against a working copy of the list; the second hands the
//! absorbed ids to their new owners.

use super::group::GroupContent;
use super::{Content, ContentGraph, ContentId};

enum Absorption {
    Repeater { owner: ContentId, items: Vec<ContentId> },
    Merge { owner: ContentId, items: Vec<ContentId> },
}

fn already_resolved(graph: &ContentGraph, id: ContentId) -> bool {
    match &graph.node(id).kind {
        Content::Repeater(r) => r.group.is_some(),
        Content::MergePaths(m) => m.resolved,
        _ => true,
    }
}

fn plan(graph: &ContentGraph, children: &[ContentId]) -> (Vec<ContentId>, Vec<Absorption>) {
    let greedy: Vec<ContentId> = children
        .iter()
        .copied()
        .filter(|c| graph.node(*c).kind.is_greedy() && !already_resolved(graph, *c))
        .collect();

    let mut remaining = children.to_vec();
    let mut absorptions = Vec::with_capacity(greedy.len());
    for owner in greedy {
        let Some(pos) = remaining.iter().position(|c| *c == owner) else {
            continue;
        };
        match &graph.node(owner).kind {
            Content::Repeater(_) => {
                let items: Vec<ContentId> = remaining.drain(..pos).collect();
                absorptions.push(Absorption::Repeater { owner, items });
            }
            Content::MergePaths(_) => {
                let start = remaining[..pos]
                    .iter()
                    .rposition(|c| !graph.node(*c).kind.is_path())
                    .map_or(0, |i| i + 1);
                let items: Vec<ContentId> = remaining.drain(start..pos).collect();
                absorptions.push(Absorption::Merge { owner, items });
            }
            _ => {}
        }
    }
    (remaining, absorptions)
}

/// Resolves greedy children of one group. Returns the final child list and
/// the number of absorptions performed.
pub(crate) fn resolve(graph: &mut ContentGraph, children: Vec<ContentId>) -> (Vec<ContentId>, usize) {
    let (remaining, absorptions) = plan(graph, &children);
    let count = absorptions.len();
    for absorption in absorptions {
        match absorption {
            Absorption::Repeater { owner, items } => {
                let mut body = GroupContent::new(None, true);
                body.path_children = path_subset(graph, &items);
                body.children = items;
                let name = graph.node(owner).name.clone();
                let inner = graph.push(name, Content::Group(body));
                if let Content::Repeater(r) = &mut graph.node_mut(owner).kind {
                    r.group = Some(inner);
                }
            }
            Absorption::Merge { owner, items } => {
                if let Content::MergePaths(m) = &mut graph.node_mut(owner).kind {
                    m.absorbed = items;
                    m.resolved = true;
                }
            }
        }
    }
    (remaining, count)
}

pub(crate) fn path_subset(graph: &ContentGraph, items: &[ContentId]) -> Vec<ContentId> {
    items
        .iter()
        .copied()
        .filter(|c| graph.node(*c).kind.is_path())
        .collect()
}
