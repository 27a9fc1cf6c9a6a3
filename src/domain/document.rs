use serde::Serialize;

use super::ports::DrawingSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TEXT: Color = Color::rgb(51, 51, 51);
    pub const MUTED: Color = Color::rgb(110, 110, 110);
    pub const PRIMARY: Color = Color::rgb(30, 64, 175);
    pub const PANEL: Color = Color::rgb(241, 243, 246);
    pub const RULE: Color = Color::rgb(210, 214, 220);
    pub const HIGHLIGHT: Color = Color::rgb(236, 253, 245);
    pub const DISCOUNT: Color = Color::rgb(185, 28, 28);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Font {
    pub weight: FontWeight,
    pub size: f64,
}

impl Font {
    pub const fn regular(size: f64) -> Self {
        Self {
            weight: FontWeight::Regular,
            size,
        }
    }

    pub const fn bold(size: f64) -> Self {
        Self {
            weight: FontWeight::Bold,
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Opaque reference to an image the renderer knows how to load (URL, data URI, key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawCommand {
    Text {
        content: String,
        x: f64,
        y: f64,
        align: TextAlign,
        font: Font,
        color: Color,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        corner_radius: f64,
        fill_color: Color,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
        width: f64,
    },
    Image {
        image: ImageRef,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
}

impl DrawCommand {
    pub fn text_content(&self) -> Option<&str> {
        match self {
            DrawCommand::Text { content, .. } => Some(content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(DrawCommand::text_content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub filename: String,
    pub pages: Vec<Page>,
}

impl Document {
    /// Replay every page, in order, onto a rendering backend.
    pub fn render<S: DrawingSurface>(&self, surface: &mut S) {
        for page in &self.pages {
            surface.new_page(page.width, page.height);
            for command in &page.commands {
                match command {
                    DrawCommand::Text {
                        content,
                        x,
                        y,
                        align,
                        font,
                        color,
                    } => surface.draw_text(content, *x, *y, *align, *font, *color),
                    DrawCommand::Rect {
                        x,
                        y,
                        w,
                        h,
                        corner_radius,
                        fill_color,
                    } => surface.draw_rect(*x, *y, *w, *h, *corner_radius, *fill_color),
                    DrawCommand::Line {
                        x1,
                        y1,
                        x2,
                        y2,
                        color,
                        width,
                    } => surface.draw_line(*x1, *y1, *x2, *y2, *color, *width),
                    DrawCommand::Image { image, x, y, w, h } => {
                        surface.draw_image(image, *x, *y, *w, *h)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<String>,
    }

    impl DrawingSurface for RecordingSurface {
        fn new_page(&mut self, width: f64, height: f64) {
            self.calls.push(format!("page {}x{}", width, height));
        }
        fn draw_text(&mut self, content: &str, _x: f64, _y: f64, align: TextAlign, _f: Font, _c: Color) {
            self.calls.push(format!("text {} {:?}", content, align));
        }
        fn draw_rect(&mut self, _x: f64, _y: f64, w: f64, h: f64, _r: f64, _fill: Color) {
            self.calls.push(format!("rect {}x{}", w, h));
        }
        fn draw_line(&mut self, _x1: f64, _y1: f64, _x2: f64, _y2: f64, _c: Color, width: f64) {
            self.calls.push(format!("line {}", width));
        }
        fn draw_image(&mut self, image: &ImageRef, _x: f64, _y: f64, _w: f64, _h: f64) {
            self.calls.push(format!("image {}", image.0));
        }
    }

    fn page(number: usize, commands: Vec<DrawCommand>) -> Page {
        Page {
            number,
            width: 100.0,
            height: 200.0,
            commands,
        }
    }

    #[test]
    fn render_replays_pages_in_order() {
        let doc = Document {
            filename: "x.pdf".to_string(),
            pages: vec![
                page(
                    1,
                    vec![
                        DrawCommand::Image {
                            image: ImageRef("logo.png".to_string()),
                            x: 0.0,
                            y: 0.0,
                            w: 10.0,
                            h: 10.0,
                        },
                        DrawCommand::Text {
                            content: "Olá".to_string(),
                            x: 1.0,
                            y: 2.0,
                            align: TextAlign::Right,
                            font: Font::bold(12.0),
                            color: Color::BLACK,
                        },
                    ],
                ),
                page(
                    2,
                    vec![
                        DrawCommand::Rect {
                            x: 0.0,
                            y: 0.0,
                            w: 5.0,
                            h: 6.0,
                            corner_radius: 0.0,
                            fill_color: Color::PANEL,
                        },
                        DrawCommand::Line {
                            x1: 0.0,
                            y1: 0.0,
                            x2: 1.0,
                            y2: 0.0,
                            color: Color::RULE,
                            width: 0.5,
                        },
                    ],
                ),
            ],
        };

        let mut surface = RecordingSurface::default();
        doc.render(&mut surface);
        assert_eq!(
            surface.calls,
            vec![
                "page 100x200",
                "image logo.png",
                "text Olá Right",
                "page 100x200",
                "rect 5x6",
                "line 0.5",
            ]
        );
    }

    #[test]
    fn draw_commands_serialize_with_type_tag() {
        let cmd = DrawCommand::Line {
            x1: 0.0,
            y1: 1.0,
            x2: 2.0,
            y2: 1.0,
            color: Color::RULE,
            width: 0.5,
        };
        let v = serde_json::to_value(&cmd).unwrap();
        assert_eq!(v["type"], "line");
        assert_eq!(v["color"]["r"], 210);
    }
}
