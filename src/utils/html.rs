// src/utils/html.rs

//! Text helpers over parsed HTML.

use std::iter;

use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};

/// Parse a CSS selector, mapping failures into [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Whether `element` is, or sits inside, a node matching `skip`.
///
/// Only nodes strictly below `root` are considered.
pub fn is_hidden(element: ElementRef<'_>, root: ElementRef<'_>, skip: &Selector) -> bool {
    iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .take_while(|node| node.id() != root.id())
        .any(|node| skip.matches(&node))
}

/// Concatenate the trimmed text fragments below `element`, dropping blanks.
///
/// Text inside nodes matching `skip` (relative to `root`) is left out.
pub fn stripped_text(element: ElementRef<'_>, root: ElementRef<'_>, skip: Option<&Selector>) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            if let Some(skip) = skip {
                let parent = node.parent().and_then(ElementRef::wrap)?;
                if is_hidden(parent, root, skip) {
                    return None;
                }
            }
            Some(text.trim())
        })
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Elements below `root` matching `selector`, in document order, minus hidden ones.
pub fn select_visible<'a>(
    root: ElementRef<'a>,
    selector: &Selector,
    skip: &Selector,
) -> Vec<ElementRef<'a>> {
    root.select(selector)
        .filter(|element| !is_hidden(*element, root, skip))
        .collect()
}
