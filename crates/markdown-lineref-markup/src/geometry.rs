//! Approximate SVG geometry.
//!
//! There is no layout engine behind a DOM snapshot, so bounding boxes are
//! estimated from geometry attributes. Good enough to size a transparent
//! hit-area over a thin edge; not a substitute for `getBBox()`.

use crate::dom::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut min_x, mut min_y) = *first;
        let (mut max_x, mut max_y) = *first;
        for (x, y) in rest {
            min_x = min_x.min(*x);
            min_y = min_y.min(*y);
            max_x = max_x.max(*x);
            max_y = max_y.max(*y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    pub fn union(self, other: Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// Grow the box symmetrically so neither side is thinner than `min`.
    pub fn inflate_to(self, min: f64) -> Self {
        let mut out = self;
        if out.width < min {
            out.x -= (min - out.width) / 2.0;
            out.width = min;
        }
        if out.height < min {
            out.y -= (min - out.height) / 2.0;
            out.height = min;
        }
        out
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Bounding box of `id` in its parent's coordinate system.
pub fn bounding_box(doc: &Document, id: NodeId) -> Option<BoundingBox> {
    let element = doc.element(id)?;
    let num = |name: &str| element.attr(name).and_then(parse_number);
    let name = element.name.to_ascii_lowercase();

    let local = match name.as_str() {
        "rect" | "image" | "foreignobject" | "use" => Some(BoundingBox {
            x: num("x").unwrap_or(0.0),
            y: num("y").unwrap_or(0.0),
            width: num("width")?,
            height: num("height")?,
        }),
        "line" => BoundingBox::from_points(&[
            (num("x1").unwrap_or(0.0), num("y1").unwrap_or(0.0)),
            (num("x2").unwrap_or(0.0), num("y2").unwrap_or(0.0)),
        ]),
        "circle" => {
            let r = num("r")?;
            let (cx, cy) = (num("cx").unwrap_or(0.0), num("cy").unwrap_or(0.0));
            BoundingBox::from_points(&[(cx - r, cy - r), (cx + r, cy + r)])
        }
        "ellipse" => {
            let (rx, ry) = (num("rx")?, num("ry")?);
            let (cx, cy) = (num("cx").unwrap_or(0.0), num("cy").unwrap_or(0.0));
            BoundingBox::from_points(&[(cx - rx, cy - ry), (cx + rx, cy + ry)])
        }
        "polygon" | "polyline" => {
            let values = numbers(element.attr("points")?);
            let points: Vec<_> = values.chunks_exact(2).map(|c| (c[0], c[1])).collect();
            BoundingBox::from_points(&points)
        }
        "path" => BoundingBox::from_points(&path_points(element.attr("d")?)),
        "text" => {
            let (x, y) = (num("x").unwrap_or(0.0), num("y").unwrap_or(0.0));
            Some(BoundingBox {
                x,
                y,
                width: 0.0,
                height: 0.0,
            })
        }
        _ => doc
            .element_children(id)
            .filter_map(|c| bounding_box(doc, c))
            .reduce(BoundingBox::union),
    }?;

    let (dx, dy) = element.attr("transform").map_or((0.0, 0.0), translation);
    Some(local.translate(dx, dy))
}

/// Offset of a `translate(x[, y])` transform; other transforms are ignored.
pub fn translation(transform: &str) -> (f64, f64) {
    let Some(start) = transform.find("translate(") else {
        return (0.0, 0.0);
    };
    let args = &transform[start + "translate(".len()..];
    let args = args.split(')').next().unwrap_or("");
    let values = numbers(args);
    (
        values.first().copied().unwrap_or(0.0),
        values.get(1).copied().unwrap_or(0.0),
    )
}

fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_end_matches("px")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Every number in a coordinate list, tolerant of `,`/whitespace separators
/// and of numbers packed together like `1-2` or `.5.5`.
fn numbers(input: &str) -> Vec<f64> {
    let mut out = Vec::new();
    let mut current = String::new();
    let flush = |current: &mut String, out: &mut Vec<f64>| {
        if let Ok(n) = current.parse::<f64>() {
            out.push(n);
        }
        current.clear();
    };

    for c in input.chars() {
        match c {
            '0'..='9' => current.push(c),
            '.' if current.contains('.') && !current.ends_with(['e', 'E']) => {
                flush(&mut current, &mut out);
                current.push(c);
            }
            '.' => current.push(c),
            'e' | 'E' if !current.is_empty() => current.push(c),
            '-' | '+' if current.ends_with(['e', 'E']) => current.push(c),
            '-' | '+' => {
                flush(&mut current, &mut out);
                current.push(c);
            }
            _ => flush(&mut current, &mut out),
        }
    }
    flush(&mut current, &mut out);
    out
}

/// Absolute points visited by a path, including control points.
fn path_points(d: &str) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    let (mut cx, mut cy) = (0.0_f64, 0.0_f64);
    let (mut start_x, mut start_y) = (0.0_f64, 0.0_f64);

    // Split into (command, args) segments
    let mut segments: Vec<(char, String)> = Vec::new();
    for c in d.chars() {
        if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
            segments.push((c, String::new()));
        } else if let Some((_, args)) = segments.last_mut() {
            args.push(c);
        }
    }

    for (cmd, args) in segments {
        let values = numbers(&args);
        let relative = cmd.is_ascii_lowercase();
        let arity = match cmd.to_ascii_uppercase() {
            'M' | 'L' | 'T' => 2,
            'H' | 'V' => 1,
            'S' | 'Q' => 4,
            'C' => 6,
            'A' => 7,
            _ => 0,
        };

        if arity == 0 {
            cx = start_x;
            cy = start_y;
            continue;
        }

        for (n, chunk) in values.chunks_exact(arity).enumerate() {
            let (ox, oy) = if relative { (cx, cy) } else { (0.0, 0.0) };
            match cmd.to_ascii_uppercase() {
                'H' => cx = ox + chunk[0],
                'V' => cy = oy + chunk[0],
                'A' => {
                    cx = ox + chunk[5];
                    cy = oy + chunk[6];
                }
                _ => {
                    for pair in chunk.chunks_exact(2) {
                        points.push((ox + pair[0], oy + pair[1]));
                    }
                    cx = ox + chunk[arity - 2];
                    cy = oy + chunk[arity - 1];
                }
            }
            if cmd.eq_ignore_ascii_case(&'M') && n == 0 {
                start_x = cx;
                start_y = cy;
            }
            points.push((cx, cy));
        }
    }

    points
}
