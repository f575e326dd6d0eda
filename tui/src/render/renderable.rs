use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;

pub trait Renderable {
    fn render(&self, area: Rect, buf: &mut Buffer);
    fn desired_height(&self, width: u16) -> u16;
    fn cursor_pos(&self, _area: Rect) -> Option<(u16, u16)> {
        None
    }
}

pub type RenderableItem<'a> = Box<dyn Renderable + 'a>;

impl<'a, R> From<R> for Box<dyn Renderable + 'a>
where
    R: Renderable + 'a,
{
    fn from(value: R) -> Self {
        Box::new(value)
    }
}

impl Renderable for () {
    fn render(&self, _area: Rect, _buf: &mut Buffer) {}
    fn desired_height(&self, _width: u16) -> u16 {
        0
    }
}

impl<'a> Renderable for Line<'a> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        buf.set_line(area.x, area.y, self, area.width);
    }
    fn desired_height(&self, _width: u16) -> u16 {
        1
    }
}

impl<R: Renderable> Renderable for Option<R> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        if let Some(renderable) = self {
            renderable.render(area, buf);
        }
    }

    fn desired_height(&self, width: u16) -> u16 {
        if let Some(renderable) = self {
            renderable.desired_height(width)
        } else {
            0
        }
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        self.as_ref().and_then(|renderable| renderable.cursor_pos(area))
    }
}

impl<R: Renderable + ?Sized> Renderable for &R {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        (**self).render(area, buf);
    }

    fn desired_height(&self, width: u16) -> u16 {
        (**self).desired_height(width)
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        (**self).cursor_pos(area)
    }
}

/// Stacks children top to bottom, giving each its desired height.
pub struct ColumnRenderable<'a> {
    children: Vec<RenderableItem<'a>>,
}

impl ColumnRenderable<'_> {
    fn child_areas(&self, area: Rect) -> Vec<Rect> {
        let mut y = area.y;
        self.children
            .iter()
            .map(|child| {
                let child_area = Rect::new(area.x, y, area.width, child.desired_height(area.width))
                    .intersection(area);
                y += child_area.height;
                child_area
            })
            .collect()
    }
}

impl Renderable for ColumnRenderable<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        for (child, child_area) in self.children.iter().zip(self.child_areas(area)) {
            if !child_area.is_empty() {
                child.render(child_area, buf);
            }
        }
    }

    fn desired_height(&self, width: u16) -> u16 {
        self.children
            .iter()
            .map(|child| child.desired_height(width))
            .sum()
    }

    /// Returns the cursor position of the first child that has one.
    ///
    /// It is generally assumed that either zero or one child will have a cursor position.
    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        self.children
            .iter()
            .zip(self.child_areas(area))
            .filter(|(_, child_area)| !child_area.is_empty())
            .find_map(|(child, child_area)| child.cursor_pos(child_area))
    }
}

impl<'a> ColumnRenderable<'a> {
    pub fn with<I, T>(children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RenderableItem<'a>>,
    {
        Self {
            children: children.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed {
        height: u16,
        cursor: Option<(u16, u16)>,
    }

    impl Renderable for Fixed {
        fn render(&self, _area: Rect, _buf: &mut Buffer) {}
        fn desired_height(&self, _width: u16) -> u16 {
            self.height
        }
        fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
            self.cursor.map(|(dx, dy)| (area.x + dx, area.y + dy))
        }
    }

    #[test]
    fn column_offsets_cursor_by_preceding_children() {
        let column = ColumnRenderable::with([
            Fixed {
                height: 2,
                cursor: None,
            },
            Fixed {
                height: 3,
                cursor: Some((4, 1)),
            },
        ]);
        let area = Rect::new(1, 5, 20, 10);
        assert_eq!(column.desired_height(20), 5);
        assert_eq!(column.cursor_pos(area), Some((5, 8)));
    }
}
