//! Text format for point clouds, used by the command-line demo
//!
//! Each non-empty line holds `x y z` and an optional selection marker (`s`,
//! `1`, or `true`); `#` starts a comment.
use crate::{
    error::{Error, Result},
    point::ControlPoint,
};
use nalgebra::Vector3;
use rand::Rng;
use std::io::{BufRead, Write};

/// A set of control points
#[derive(Clone, Debug, Default)]
pub struct PointCloud {
    /// Points, in file order
    pub points: Vec<ControlPoint>,
}

impl PointCloud {
    /// Parses a point cloud from text
    pub fn from_text<R: BufRead>(r: R) -> Result<Self> {
        let mut points = vec![];
        for (i, line) in r.lines().enumerate() {
            let line = line?;
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            points.push(parse_line(line, i + 1)?);
        }
        Ok(Self { points })
    }

    /// Builds a random cloud in the `[-1, 1]` cube
    ///
    /// Each point is selected with probability `selected`, which must be in
    /// `[0, 1]`.
    pub fn random<R: Rng + ?Sized>(
        n: usize,
        selected: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&selected) {
            return Err(Error::BadSelectionFraction(selected));
        }
        let points = (0..n)
            .map(|_| {
                let pos = Vector3::new(
                    rng.gen_range(-1.0..=1.0),
                    rng.gen_range(-1.0..=1.0),
                    rng.gen_range(-1.0..=1.0),
                );
                ControlPoint::new(pos, rng.gen_bool(selected))
            })
            .collect();
        Ok(Self { points })
    }

    /// Writes one line per point: position, selection, distance, and factor
    ///
    /// Missing distances are written as `-`.
    pub fn write_results<W: Write>(&self, w: &mut W) -> Result<()> {
        writeln!(w, "# x y z selected distance factor")?;
        for p in &self.points {
            let d = match p.distance {
                Some(d) => d.to_string(),
                None => "-".to_owned(),
            };
            writeln!(
                w,
                "{} {} {} {} {} {}",
                p.pos.x,
                p.pos.y,
                p.pos.z,
                u8::from(p.selected),
                d,
                p.factor
            )?;
        }
        Ok(())
    }
}

fn parse_line(line: &str, lineno: usize) -> Result<ControlPoint> {
    let err = |msg: String| Error::ParseError { line: lineno, msg };
    let words: Vec<&str> = line.split_whitespace().collect();
    if !(3..=4).contains(&words.len()) {
        return Err(err(format!("expected 3 or 4 fields, got {}", words.len())));
    }
    let mut pos = Vector3::zeros();
    for (i, w) in words[..3].iter().enumerate() {
        pos[i] = w
            .parse::<f32>()
            .map_err(|e| err(format!("bad coordinate {w:?}: {e}")))?;
    }
    let selected = match words.get(3) {
        None => false,
        Some(&("s" | "1" | "true")) => true,
        Some(&("0" | "false")) => false,
        Some(w) => return Err(err(format!("bad selection marker {w:?}"))),
    };
    Ok(ControlPoint::new(pos, selected))
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn random_selection_fraction() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let all = PointCloud::random(20, 1.0, &mut rng).unwrap();
        assert!(all.points.iter().all(|p| p.selected));
        let none = PointCloud::random(20, 0.0, &mut rng).unwrap();
        assert!(none.points.iter().all(|p| !p.selected));

        for bad in [f64::NAN, f64::INFINITY, -0.5, 1.5] {
            assert!(matches!(
                PointCloud::random(20, bad, &mut rng),
                Err(Error::BadSelectionFraction(..))
            ));
        }
    }

    #[test]
    fn parse() {
        let text = "# comment\n0 0 0 s\n\n1 2 3\n4 5 6 0 # trailing\n";
        let cloud = PointCloud::from_text(text.as_bytes()).unwrap();
        assert_eq!(cloud.points.len(), 3);
        assert!(cloud.points[0].selected);
        assert!(!cloud.points[1].selected);
        assert_eq!(cloud.points[1].pos, Vector3::new(1.0, 2.0, 3.0));
        assert!(!cloud.points[2].selected);
    }

    #[test]
    fn parse_errors() {
        let e = PointCloud::from_text("0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(e, Error::ParseError { line: 1, .. }));
        let e = PointCloud::from_text("\n0 0 x\n".as_bytes()).unwrap_err();
        assert!(matches!(e, Error::ParseError { line: 2, .. }));
        let e = PointCloud::from_text("0 0 0 maybe\n".as_bytes()).unwrap_err();
        assert!(matches!(e, Error::ParseError { line: 1, .. }));
    }

    #[test]
    fn write() {
        let mut cloud = PointCloud::from_text("0 0 0 s\n1 0 0\n".as_bytes()).unwrap();
        cloud.points[0].distance = Some(0.0);
        cloud.points[0].factor = 1.0;
        let mut out = vec![];
        cloud.write_results(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "0 0 0 1 0 1");
        assert_eq!(lines[2], "1 0 0 0 - 0");
    }
}
