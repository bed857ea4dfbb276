//! Mini path language used by shape and clip-path strings.
//!
//! Supported commands: `M L H V C S Q Z` in absolute (upper-case) and relative (lower-case)
//! form. `A`/`a` are accepted and ignored. Tokenization splits on command letters, turns commas
//! into spaces and splits the remaining numbers on whitespace.
//!
//! `S`/`s` only reflects the previous cubic control point when that point is non-zero in both
//! coordinates. Otherwise the command is drawn as a quadratic curve through its first point.
//! Existing content depends on this, so it is kept as-is.

use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::{SvgaError, SvgaResult};

/// One command letter with its numeric arguments.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Segment {
    pub(crate) cmd: char,
    pub(crate) args: Vec<f64>,
}

fn is_command(c: char) -> bool {
    c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')
}

/// Split a path string into command segments.
pub(crate) fn tokenize(d: &str) -> SvgaResult<Vec<Segment>> {
    let mut out = Vec::<Segment>::new();
    let mut current: Option<(char, String)> = None;

    for c in d.chars() {
        if is_command(c) {
            if let Some((cmd, raw)) = current.take() {
                out.push(Segment {
                    cmd,
                    args: parse_args(cmd, &raw)?,
                });
            }
            current = Some((c, String::new()));
        } else if let Some((_, raw)) = current.as_mut() {
            raw.push(if c == ',' { ' ' } else { c });
        } else if !c.is_whitespace() {
            return Err(SvgaError::render(format!(
                "path data must start with a command, found '{c}'"
            )));
        }
    }
    if let Some((cmd, raw)) = current {
        out.push(Segment {
            cmd,
            args: parse_args(cmd, &raw)?,
        });
    }
    Ok(out)
}

fn parse_args(cmd: char, raw: &str) -> SvgaResult<Vec<f64>> {
    raw.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| {
                SvgaError::render(format!("invalid number '{tok}' after path command '{cmd}'"))
            })
        })
        .collect()
}

fn arity(cmd: char) -> Option<usize> {
    match cmd.to_ascii_uppercase() {
        'M' | 'L' => Some(2),
        'H' | 'V' => Some(1),
        'C' => Some(6),
        'S' | 'Q' => Some(4),
        'Z' => Some(0),
        _ => None,
    }
}

#[derive(Default)]
struct Cursor {
    current: Point,
    subpath_start: Point,
    /// Second control point of the previous cubic (absolute), if the previous command was one.
    last_cubic_ctrl: Option<Point>,
    /// Set after a close; the next drawing command opens a new subpath.
    needs_move: bool,
}

/// Parse path data into a [`BezPath`].
///
/// Argument groups may repeat (`L 1 2 3 4` is two lines); extra pairs after a move are lines.
pub fn parse_path(d: &str) -> SvgaResult<BezPath> {
    let mut path = BezPath::new();
    let mut cur = Cursor::default();

    for seg in tokenize(d)? {
        // Arcs are accepted but not drawn, whatever their arguments.
        if seg.cmd.eq_ignore_ascii_case(&'a') {
            cur.last_cubic_ctrl = None;
            continue;
        }
        let Some(n) = arity(seg.cmd) else {
            tracing::debug!(cmd = %seg.cmd, "ignoring unsupported path command");
            cur.last_cubic_ctrl = None;
            continue;
        };
        if n == 0 {
            if !path.elements().is_empty() {
                path.close_path();
                cur.needs_move = true;
            }
            cur.current = cur.subpath_start;
            cur.last_cubic_ctrl = None;
            continue;
        }
        if seg.args.len() < n {
            return Err(SvgaError::render(format!(
                "path command '{}' needs {n} arguments, got {}",
                seg.cmd,
                seg.args.len()
            )));
        }
        let groups = seg.args.chunks_exact(n);
        if !groups.remainder().is_empty() {
            tracing::debug!(cmd = %seg.cmd, "ignoring trailing path arguments");
        }
        for (i, a) in groups.enumerate() {
            let cmd = match seg.cmd {
                'M' if i > 0 => 'L',
                'm' if i > 0 => 'l',
                c => c,
            };
            apply(&mut path, &mut cur, cmd, a);
        }
    }
    Ok(path)
}

fn apply(path: &mut BezPath, cur: &mut Cursor, cmd: char, a: &[f64]) {
    let relative = cmd.is_ascii_lowercase();
    let origin = if relative {
        cur.current
    } else {
        Point::ZERO
    };
    let pt = |x: f64, y: f64| Point::new(origin.x + x, origin.y + y);

    let upper = cmd.to_ascii_uppercase();
    // Drawing commands before any move start a subpath at the current point.
    if upper != 'M' && (cur.needs_move || path.elements().is_empty()) {
        path.move_to(cur.current);
        cur.subpath_start = cur.current;
        cur.needs_move = false;
    }

    match upper {
        'M' => {
            let p = pt(a[0], a[1]);
            path.move_to(p);
            cur.current = p;
            cur.subpath_start = p;
            cur.last_cubic_ctrl = None;
            cur.needs_move = false;
        }
        'L' => {
            let p = pt(a[0], a[1]);
            path.line_to(p);
            cur.current = p;
            cur.last_cubic_ctrl = None;
        }
        'H' => {
            let x = if relative { cur.current.x + a[0] } else { a[0] };
            let p = Point::new(x, cur.current.y);
            path.line_to(p);
            cur.current = p;
            cur.last_cubic_ctrl = None;
        }
        'V' => {
            let y = if relative { cur.current.y + a[0] } else { a[0] };
            let p = Point::new(cur.current.x, y);
            path.line_to(p);
            cur.current = p;
            cur.last_cubic_ctrl = None;
        }
        'C' => {
            let c1 = pt(a[0], a[1]);
            let c2 = pt(a[2], a[3]);
            let p = pt(a[4], a[5]);
            path.curve_to(c1, c2, p);
            cur.current = p;
            cur.last_cubic_ctrl = Some(c2);
        }
        'S' => {
            let c2 = pt(a[0], a[1]);
            let p = pt(a[2], a[3]);
            match cur.last_cubic_ctrl {
                Some(prev) if prev.x != 0.0 && prev.y != 0.0 => {
                    let c1 = Point::new(
                        2.0 * cur.current.x - prev.x,
                        2.0 * cur.current.y - prev.y,
                    );
                    path.curve_to(c1, c2, p);
                }
                _ => path.quad_to(c2, p),
            }
            cur.current = p;
            cur.last_cubic_ctrl = Some(c2);
        }
        'Q' => {
            let c = pt(a[0], a[1]);
            let p = pt(a[2], a[3]);
            path.quad_to(c, p);
            cur.current = p;
            cur.last_cubic_ctrl = None;
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/path.rs"]
mod tests;
