//! Small value types shared by the catalog, the scene document and the script generators.

/// A world-space position or scale (Blender units, Z up).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// `(x, y, z)` as a Python tuple literal.
    pub fn to_py_tuple(self) -> String {
        format!(
            "({}, {}, {})",
            py_number(self.x),
            py_number(self.y),
            py_number(self.z)
        )
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

/// Euler XYZ rotation in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Euler {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Euler {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn radians(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn degrees(x: f64, y: f64, z: f64) -> Self {
        Self::radians(x.to_radians(), y.to_radians(), z.to_radians())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Python tuple with each non-zero axis spelled `math.radians(<deg>)`.
    pub fn to_py_tuple(self) -> String {
        format!(
            "({}, {}, {})",
            py_angle(self.x),
            py_angle(self.y),
            py_angle(self.z)
        )
    }
}

/// Linear RGB colour, alpha implied opaque.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    pub fn to_py_rgba(self) -> String {
        format!(
            "({}, {}, {}, 1.0)",
            py_number(self.0),
            py_number(self.1),
            py_number(self.2)
        )
    }

    pub fn to_py_rgb(self) -> String {
        format!(
            "({}, {}, {})",
            py_number(self.0),
            py_number(self.1),
            py_number(self.2)
        )
    }
}

fn round6(v: f64) -> f64 {
    let r = (v * 1e6).round() / 1e6;
    // Collapse -0.0 so it prints as `0`.
    if r == 0.0 { 0.0 } else { r }
}

/// Shortest Python literal for `v`: integral values print without a fractional part.
pub fn py_number(v: f64) -> String {
    let r = round6(v);
    if r.fract() == 0.0 && r.abs() < 1e15 {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}

/// Python float literal that always carries a fractional part (`50.0`, `45.5`).
pub fn py_float(v: f64) -> String {
    let r = round6(v);
    if r.fract() == 0.0 && r.abs() < 1e15 {
        format!("{}.0", r as i64)
    } else {
        format!("{r}")
    }
}

/// Radians rendered as `math.radians(<deg>)`, or `0` for a zero angle.
pub fn py_angle(rad: f64) -> String {
    let deg = round6(rad.to_degrees());
    if deg == 0.0 {
        "0".to_string()
    } else {
        format!("math.radians({})", py_number(deg))
    }
}

/// Quote `s` as a Python string literal.
pub fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_print_like_hand_written_python() {
        assert_eq!(py_number(35.0), "35");
        assert_eq!(py_number(-45.0), "-45");
        assert_eq!(py_number(32.5), "32.5");
        assert_eq!(py_number(-0.0), "0");
        assert_eq!(py_float(50.0), "50.0");
        assert_eq!(py_float(45.25), "45.25");
    }

    #[test]
    fn angles_round_trip_through_degrees() {
        assert_eq!(py_angle(30f64.to_radians()), "math.radians(30)");
        assert_eq!(py_angle((-10f64).to_radians()), "math.radians(-10)");
        assert_eq!(py_angle(0.0), "0");
        assert_eq!(
            Euler::degrees(30.0, 10.0, 0.0).to_py_tuple(),
            "(math.radians(30), math.radians(10), 0)"
        );
    }

    #[test]
    fn tuples_and_strings() {
        assert_eq!(Vec3::new(0.0, -50.0, 35.0).to_py_tuple(), "(0, -50, 35)");
        assert_eq!(Rgb(1.0, 0.2, 0.8).to_py_rgba(), "(1, 0.2, 0.8, 1.0)");
        assert_eq!(py_str("it's"), "'it\\'s'");
        assert_eq!(py_str("C:\\renders\\a.png"), "'C:\\\\renders\\\\a.png'");
    }
}
