//! Color space conversions: `{XYZ, xyY, sRGB, linearSRGB, displayP3,
//! linearDisplayP3, Oklab} x {straight, premultiplied}`.

use crate::geometry::{Mat3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColorSpace {
    Xyz,
    XyY,
    Srgb,
    LinearSrgb,
    DisplayP3,
    LinearDisplayP3,
    Oklab,
}

#[inline]
fn srgb_to_linear_channel(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb_channel(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn map_rgb(c: Vec4, f: impl Fn(f64) -> f64) -> Vec4 {
    Vec4::new(f(c.x), f(c.y), f(c.z), c.w)
}

/// Bradford-adapted sRGB primaries -> XYZ (D65), the standard sRGB/XYZ matrix.
fn srgb_linear_to_xyz_matrix() -> Mat3 {
    #[rustfmt::skip]
    let m = Mat3::new(
        0.412_390_80, 0.357_584_34, 0.180_480_80,
        0.212_639_00, 0.715_168_60, 0.072_192_40,
        0.019_330_82, 0.119_194_78, 0.950_532_14,
    );
    m
}

fn xyz_to_srgb_linear_matrix() -> Mat3 {
    #[rustfmt::skip]
    let m = Mat3::new(
        3.240_969_9, -1.537_383_2, -0.498_610_76,
        -0.969_243_64, 1.875_967_5, 0.041_555_06,
        0.055_630_08, -0.203_976_97, 1.056_971_5,
    );
    m
}

/// DisplayP3 linear primaries -> XYZ (D65).
fn display_p3_linear_to_xyz_matrix() -> Mat3 {
    #[rustfmt::skip]
    let m = Mat3::new(
        0.486_570_95, 0.265_667_69, 0.198_217_35,
        0.228_974_70, 0.691_738_52, 0.079_286_78,
        0.0, 0.045_113_38, 1.043_944_1,
    );
    m
}

fn xyz_to_display_p3_linear_matrix() -> Mat3 {
    #[rustfmt::skip]
    let m = Mat3::new(
        2.493_496_9, -0.931_383_62, -0.402_710_79,
        -0.829_489_0, 1.762_664_1, 0.023_624_69,
        0.035_845_83, -0.076_172_39, 0.956_884_5,
    );
    m
}

fn apply_3x3(m: &Mat3, c: Vec4) -> Vec4 {
    let v = m * nalgebra::Vector3::new(c.x, c.y, c.z);
    Vec4::new(v.x, v.y, v.z, c.w)
}

/// Oklab, via the Bjorn Ottosson cube-root formulation (linear sRGB <-> Oklab).
mod oklab {
    use super::*;

    #[rustfmt::skip]
    const M1: [[f64; 3]; 3] = [
        [0.412_221_46, 0.536_332_55, 0.051_445_99],
        [0.211_903_50, 0.680_699_50, 0.107_396_90],
        [0.088_302_46, 0.281_718_85, 0.629_960_65],
    ];
    #[rustfmt::skip]
    const M2: [[f64; 3]; 3] = [
        [0.210_454_26, 0.793_617_85, -0.004_072_11],
        [1.977_998_50, -2.428_592_20, 0.450_593_70],
        [0.025_904_04, 0.782_771_77, -0.808_675_81],
    ];

    fn mul(m: &[[f64; 3]; 3], v: (f64, f64, f64)) -> (f64, f64, f64) {
        (
            m[0][0] * v.0 + m[0][1] * v.1 + m[0][2] * v.2,
            m[1][0] * v.0 + m[1][1] * v.1 + m[1][2] * v.2,
            m[2][0] * v.0 + m[2][1] * v.1 + m[2][2] * v.2,
        )
    }

    pub fn linear_srgb_to_oklab(c: Vec4) -> Vec4 {
        let (l, m, s) = mul(&M1, (c.x, c.y, c.z));
        let (l_, m_, s_) = (l.max(0.0).cbrt(), m.max(0.0).cbrt(), s.max(0.0).cbrt());
        let (l_ok, a, b) = mul(&M2, (l_, m_, s_));
        Vec4::new(l_ok, a, b, c.w)
    }

    pub fn oklab_to_linear_srgb(c: Vec4) -> Vec4 {
        #[rustfmt::skip]
        const M2_INV: [[f64; 3]; 3] = [
            [1.0, 0.396_337_78, 0.215_803_96],
            [1.0, -0.105_561_346, -0.063_854_17],
            [1.0, -0.089_484_18, -1.291_485_5],
        ];
        #[rustfmt::skip]
        const M1_INV: [[f64; 3]; 3] = [
            [4.076_741_7, -3.307_711_6, 0.230_969_94],
            [-1.268_438_0, 2.609_757_4, -0.341_319_38],
            [-0.004_196_086_3, -0.703_418_6, 1.707_614_7],
        ];
        let (l_, m_, s_) = mul(&M2_INV, (c.x, c.y, c.z));
        let (l, m, s) = (l_.powi(3), m_.powi(3), s_.powi(3));
        let (r, g, b) = mul(&M1_INV, (l, m, s));
        Vec4::new(r, g, b, c.w)
    }
}

impl ColorSpace {
    /// Converts a straight (non-premultiplied) color in `self` into linear sRGB.
    pub fn to_linear_srgb(self, c: Vec4) -> Vec4 {
        match self {
            ColorSpace::LinearSrgb => c,
            ColorSpace::Srgb => map_rgb(c, srgb_to_linear_channel),
            ColorSpace::Xyz => apply_3x3(&xyz_to_srgb_linear_matrix(), c),
            ColorSpace::XyY => {
                let xyz = xy_y_to_xyz(c);
                apply_3x3(&xyz_to_srgb_linear_matrix(), xyz)
            }
            ColorSpace::DisplayP3 => {
                let linear_p3 = map_rgb(c, srgb_to_linear_channel);
                let xyz = apply_3x3(&display_p3_linear_to_xyz_matrix(), linear_p3);
                apply_3x3(&xyz_to_srgb_linear_matrix(), xyz)
            }
            ColorSpace::LinearDisplayP3 => {
                let xyz = apply_3x3(&display_p3_linear_to_xyz_matrix(), c);
                apply_3x3(&xyz_to_srgb_linear_matrix(), xyz)
            }
            ColorSpace::Oklab => oklab::oklab_to_linear_srgb(c),
        }
    }

    /// Converts a straight color from linear sRGB into `self`.
    pub fn from_linear_srgb(self, c: Vec4) -> Vec4 {
        match self {
            ColorSpace::LinearSrgb => c,
            ColorSpace::Srgb => map_rgb(c, linear_to_srgb_channel),
            ColorSpace::Xyz => apply_3x3(&srgb_linear_to_xyz_matrix(), c),
            ColorSpace::XyY => {
                let xyz = apply_3x3(&srgb_linear_to_xyz_matrix(), c);
                xyz_to_xy_y(xyz)
            }
            ColorSpace::DisplayP3 => {
                let xyz = apply_3x3(&srgb_linear_to_xyz_matrix(), c);
                let linear_p3 = apply_3x3(&xyz_to_display_p3_linear_matrix(), xyz);
                map_rgb(linear_p3, linear_to_srgb_channel)
            }
            ColorSpace::LinearDisplayP3 => {
                let xyz = apply_3x3(&srgb_linear_to_xyz_matrix(), c);
                apply_3x3(&xyz_to_display_p3_linear_matrix(), xyz)
            }
            ColorSpace::Oklab => oklab::linear_srgb_to_oklab(c),
        }
    }

    /// Converts a straight color directly from `self` to `to`, via linear sRGB.
    pub fn convert(self, to: ColorSpace, c: Vec4) -> Vec4 {
        if self == to {
            return c;
        }
        to.from_linear_srgb(self.to_linear_srgb(c))
    }
}

fn xyz_to_xy_y(xyz: Vec4) -> Vec4 {
    let sum = xyz.x + xyz.y + xyz.z;
    if sum.abs() < 1e-12 {
        Vec4::new(0.0, 0.0, xyz.y, xyz.w)
    } else {
        Vec4::new(xyz.x / sum, xyz.y / sum, xyz.y, xyz.w)
    }
}

fn xy_y_to_xyz(xy_y: Vec4) -> Vec4 {
    let (x, y, big_y) = (xy_y.x, xy_y.y, xy_y.z);
    if y.abs() < 1e-12 {
        Vec4::new(0.0, 0.0, 0.0, xy_y.w)
    } else {
        Vec4::new(x * big_y / y, big_y, (1.0 - x - y) * big_y / y, xy_y.w)
    }
}

/// Premultiplies a straight RGBA color by its own alpha.
pub fn premultiply(c: Vec4) -> Vec4 {
    Vec4::new(c.x * c.w, c.y * c.w, c.z * c.w, c.w)
}

/// Unpremultiplies a premultiplied RGBA color; alpha-zero maps RGB to zero
/// rather than dividing by zero.
pub fn unpremultiply(c: Vec4) -> Vec4 {
    if c.w.abs() < 1e-12 {
        Vec4::new(0.0, 0.0, 0.0, 0.0)
    } else {
        Vec4::new(c.x / c.w, c.y / c.w, c.z / c.w, c.w)
    }
}
