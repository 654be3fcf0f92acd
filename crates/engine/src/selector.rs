//! Element → CSS selector synthesis.
//!
//! Priority: `#id`, then `tag.class1.class2`, then a positional path from the
//! document element. Positional indices count the parent's children sharing the
//! element's tag and are emitted as `:nth-child(k)`; ids are not escaped.
//! Uniqueness is best-effort.

use crate::event::{ElementSnapshot, PathSegment};

pub fn synthesize(element: &ElementSnapshot) -> String {
    if let Some(id) = element.id_attr() {
        return format!("#{}", id);
    }

    let classes: Vec<&str> = element.class_list().collect();
    if !classes.is_empty() {
        return format!("{}.{}", element.tag.to_ascii_lowercase(), classes.join("."));
    }

    if element.path.is_empty() {
        return element.tag.to_ascii_lowercase();
    }
    positional_path(&element.path)
}

fn positional_path(path: &[PathSegment]) -> String {
    path.iter()
        .rev()
        .map(|seg| {
            let tag = seg.tag.to_ascii_lowercase();
            if seg.same_tag_count > 1 {
                format!("{}:nth-child({})", tag, seg.same_tag_index)
            } else {
                tag
            }
        })
        .collect::<Vec<_>>()
        .join(" > ")
}
