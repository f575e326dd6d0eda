use email_chips_core::AnchorGeometry;
use ratatui::layout::Position;
use ratatui::layout::Rect;

/// Interactive element under a mouse press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HitTarget {
    /// The `×` of a chip in the inline row, by store index.
    RemoveVisible(usize),
    /// The `+N` trigger.
    OverflowTrigger,
    /// The `×` of a chip inside the popover, by hidden index.
    RemoveHidden(usize),
    /// Anywhere else inside the popover.
    Popover,
    /// The text field.
    Input,
    /// Any other part of the control.
    Background,
}

impl HitTarget {
    fn is_in_popover(self) -> bool {
        matches!(self, HitTarget::Popover | HitTarget::RemoveHidden(_))
    }
}

/// Screen regions recorded during the last render, used to resolve mouse presses.
#[derive(Debug, Default)]
pub(crate) struct HitMap {
    control: Rect,
    row: Rect,
    trigger_left: Option<i32>,
    regions: Vec<(Rect, HitTarget)>,
}

impl HitMap {
    pub(crate) fn reset(&mut self, control: Rect, row: Rect) {
        self.control = control;
        self.row = row;
        self.trigger_left = None;
        self.regions.clear();
    }

    /// Later regions sit on top of earlier ones.
    pub(crate) fn push(&mut self, area: Rect, target: HitTarget) {
        if !area.is_empty() {
            self.regions.push((area, target));
        }
    }

    /// Record the trigger's left edge, even when it is partly scrolled out of view.
    pub(crate) fn set_trigger_left(&mut self, x: i32) {
        self.trigger_left = Some(x);
    }

    pub(crate) fn anchor_geometry(&self) -> Option<AnchorGeometry> {
        let trigger_left = self.trigger_left?;
        Some(AnchorGeometry {
            trigger_left,
            container_left: i32::from(self.row.x),
            container_width: i32::from(self.row.width),
        })
    }

    /// Resolve a press at `(column, row)`. `None` means outside the control.
    ///
    /// Popover regions are ignored unless `popover_open`, so a stale frame cannot route presses
    /// into a popover that has since closed.
    pub(crate) fn hit(&self, column: u16, row: u16, popover_open: bool) -> Option<HitTarget> {
        let position = Position::new(column, row);
        let found = self
            .regions
            .iter()
            .rev()
            .filter(|(_, target)| popover_open || !target.is_in_popover())
            .find(|(area, _)| area.contains(position))
            .map(|(_, target)| *target);
        if found.is_some() {
            return found;
        }
        self.control
            .contains(position)
            .then_some(HitTarget::Background)
    }
}
