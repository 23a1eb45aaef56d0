//! Window resolution for touch sources and drag payloads.

use super::{Actor, Host};

/// Where along a node the window was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Via {
    Actor,
    Delegate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<W> {
    pub window: W,
    pub via: Via,
    /// Number of parent hops from the starting node.
    pub depth: usize,
    /// Found on the node re-picked at the event coordinates.
    pub picked: bool,
}

/// Resolve the window owning `actor`.
///
/// Walks `actor` and its ancestors, checking each node and then its
/// delegate. When nothing on the chain carries a window and `coords` is
/// given, the node at those coordinates is picked and walked once more. The
/// re-pick never recurses.
pub fn find_window<H: Host>(
    host: &H,
    actor: Option<&H::Actor>,
    coords: Option<(f64, f64)>,
) -> Option<Resolution<H::Window>> {
    if let Some(found) = actor.and_then(walk_ancestry::<H::Window, H::Actor>) {
        return Some(found);
    }

    let (x, y) = coords?;
    let picked = host.actor_at(x, y)?;
    if actor == Some(&picked) {
        return None;
    }
    walk_ancestry::<H::Window, H::Actor>(&picked).map(|found| Resolution {
        picked: true,
        ..found
    })
}

fn walk_ancestry<W, A: Actor<W>>(actor: &A) -> Option<Resolution<W>> {
    let mut current = Some(actor.clone());
    let mut depth = 0;
    while let Some(node) = current {
        if let Some(window) = node.window() {
            return Some(Resolution {
                window,
                via: Via::Actor,
                depth,
                picked: false,
            });
        }
        if let Some(window) = node.delegate().and_then(|delegate| delegate.window()) {
            return Some(Resolution {
                window,
                via: Via::Delegate,
                depth,
                picked: false,
            });
        }
        current = node.parent();
        depth += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{PickRect, SimActor, SimDelegate, SimShell, SimWindow};

    #[test]
    fn resolves_on_the_node_itself() {
        let shell = SimShell::new(1000.0);
        let window = SimWindow::new("term");
        let actor = SimActor::builder("clone").window(&window).build();
        let found = find_window(&shell, Some(&actor), None).expect("window");
        assert_eq!(found.window, window);
        assert_eq!(found.via, Via::Actor);
        assert_eq!(found.depth, 0);
        assert!(!found.picked);
    }

    #[test]
    fn delegate_of_an_ancestor_wins_over_deeper_nodes() {
        let shell = SimShell::new(1000.0);
        let window = SimWindow::new("term");
        let preview = SimActor::builder("preview")
            .delegate(SimDelegate::for_window(&window))
            .build();
        let frame = SimActor::builder("frame").parent(&preview).build();
        let icon = SimActor::builder("icon").parent(&frame).build();

        let found = find_window(&shell, Some(&icon), None).expect("window");
        assert_eq!(found.window, window);
        assert_eq!(found.via, Via::Delegate);
        assert_eq!(found.depth, 2);
    }

    #[test]
    fn falls_back_to_picked_actor_once() {
        let mut shell = SimShell::new(1000.0);
        let window = SimWindow::new("term");
        let target = SimActor::builder("preview").window(&window).build();
        shell.add_pick_region(PickRect::new(0.0, 0.0, 200.0, 200.0), &target);
        let stray = SimActor::builder("label").build();

        let found = find_window(&shell, Some(&stray), Some((50.0, 50.0))).expect("window");
        assert_eq!(found.window, window);
        assert!(found.picked);

        assert!(find_window(&shell, Some(&stray), Some((500.0, 500.0))).is_none());
        assert!(find_window(&shell, Some(&stray), None).is_none());
    }

    #[test]
    fn re_picking_the_same_actor_gives_up() {
        let mut shell = SimShell::new(1000.0);
        let stray = SimActor::builder("background").build();
        shell.add_pick_region(PickRect::new(0.0, 0.0, 200.0, 200.0), &stray);
        assert!(find_window(&shell, Some(&stray), Some((10.0, 10.0))).is_none());
    }

    #[test]
    fn missing_source_still_picks() {
        let mut shell = SimShell::new(1000.0);
        let window = SimWindow::new("term");
        let target = SimActor::builder("preview").window(&window).build();
        shell.add_pick_region(PickRect::new(0.0, 0.0, 10.0, 10.0), &target);
        let found = find_window(&shell, None, Some((5.0, 5.0))).expect("window");
        assert_eq!(found.window, window);
    }
}
