use ratatui::style::Color;
use std::sync::LazyLock;

use crate::geo::GeoPoint;

// Coarse coastlines as (lat, lon) rings. Good enough at terminal resolution.
const NORTH_AMERICA: &[(f64, f64)] = &[
    (66.0, -168.0), (71.0, -157.0), (70.0, -141.0), (69.0, -130.0), (70.0, -115.0),
    (68.0, -100.0), (71.0, -90.0), (68.0, -82.0), (63.0, -90.0), (58.0, -93.0),
    (55.0, -82.0), (52.0, -79.0), (60.0, -78.0), (62.0, -74.0), (58.0, -68.0),
    (60.0, -64.0), (54.0, -58.0), (47.0, -53.0), (45.0, -61.0), (44.0, -66.0),
    (42.0, -70.0), (40.0, -74.0), (35.0, -76.0), (32.0, -81.0), (27.0, -80.0),
    (25.0, -81.0), (30.0, -84.0), (30.0, -89.0), (29.0, -95.0), (26.0, -97.0),
    (22.0, -98.0), (19.0, -96.0), (21.0, -87.0), (16.0, -88.0), (15.0, -83.0),
    (11.0, -84.0), (9.0, -79.0), (8.0, -77.0), (7.0, -80.0), (9.0, -85.0),
    (13.0, -88.0), (16.0, -95.0), (19.0, -105.0), (23.0, -106.0), (31.0, -113.0),
    (23.0, -110.0), (29.0, -115.0), (34.0, -119.0), (38.0, -123.0), (43.0, -124.0),
    (48.0, -125.0), (55.0, -131.0), (59.0, -138.0), (60.0, -146.0), (59.0, -153.0),
    (57.0, -157.0), (55.0, -163.0), (58.0, -157.0), (59.0, -162.0), (61.0, -165.0),
    (64.0, -166.0),
];

const GREENLAND: &[(f64, f64)] = &[
    (83.0, -35.0), (82.0, -60.0), (78.0, -73.0), (76.0, -68.0), (70.0, -55.0),
    (65.0, -52.0), (60.0, -44.0), (65.0, -40.0), (70.0, -22.0), (76.0, -19.0),
    (81.0, -14.0),
];

const SOUTH_AMERICA: &[(f64, f64)] = &[
    (12.0, -72.0), (11.0, -62.0), (8.0, -60.0), (5.0, -52.0), (0.0, -50.0),
    (-3.0, -40.0), (-5.0, -35.0), (-8.0, -35.0), (-13.0, -38.0), (-23.0, -42.0),
    (-25.0, -48.0), (-29.0, -49.0), (-34.0, -53.0), (-36.0, -57.0), (-39.0, -62.0),
    (-42.0, -64.0), (-46.0, -67.0), (-50.0, -68.0), (-53.0, -69.0), (-55.0, -67.0),
    (-55.0, -71.0), (-52.0, -75.0), (-46.0, -75.0), (-40.0, -74.0), (-33.0, -72.0),
    (-27.0, -71.0), (-18.0, -70.0), (-14.0, -76.0), (-6.0, -81.0), (-1.0, -80.0),
    (2.0, -79.0), (7.0, -78.0), (9.0, -76.0),
];

const EURASIA: &[(f64, f64)] = &[
    (36.0, -6.0), (37.0, -9.0), (43.0, -9.0), (44.0, -1.0), (48.0, -4.0),
    (51.0, 2.0), (54.0, 8.0), (55.0, 20.0), (60.0, 28.0), (65.0, 35.0),
    (67.0, 41.0), (68.0, 54.0), (69.0, 60.0), (73.0, 70.0), (73.0, 80.0),
    (76.0, 96.0), (77.0, 105.0), (74.0, 113.0), (72.0, 128.0), (72.0, 140.0),
    (71.0, 155.0), (69.0, 170.0), (66.0, 180.0), (64.0, 178.0), (60.0, 170.0),
    (60.0, 163.0), (57.0, 162.0), (51.0, 157.0), (59.0, 155.0), (59.0, 143.0),
    (54.0, 141.0), (50.0, 140.0), (43.0, 135.0), (40.0, 129.0), (35.0, 129.0),
    (35.0, 126.0), (38.0, 125.0), (40.0, 122.0), (37.0, 119.0), (35.0, 120.0),
    (31.0, 122.0), (27.0, 120.0), (23.0, 117.0), (21.0, 110.0), (22.0, 107.0),
    (17.0, 107.0), (10.0, 106.0), (9.0, 105.0), (13.0, 100.0), (10.0, 99.0),
    (1.0, 104.0), (3.0, 101.0), (8.0, 98.0), (16.0, 97.0), (17.0, 94.0),
    (22.0, 92.0), (22.0, 88.0), (20.0, 86.0), (16.0, 82.0), (13.0, 80.0),
    (8.0, 77.0), (11.0, 75.0), (20.0, 73.0), (22.0, 69.0), (25.0, 66.0),
    (25.0, 57.0), (27.0, 56.0), (24.0, 57.0), (22.0, 60.0), (17.0, 55.0),
    (13.0, 45.0), (16.0, 42.0), (22.0, 39.0), (28.0, 34.0), (30.0, 32.0),
    (32.0, 35.0), (36.0, 36.0), (36.0, 28.0), (40.0, 26.0), (38.0, 22.0),
    (40.0, 20.0), (42.0, 19.0), (45.0, 13.0), (41.0, 17.0), (40.0, 18.0),
    (38.0, 16.0), (44.0, 9.0), (43.0, 4.0), (41.0, 2.0), (38.0, 0.0),
];

const AFRICA: &[(f64, f64)] = &[
    (36.0, -6.0), (37.0, 10.0), (33.0, 11.0), (32.0, 20.0), (31.0, 25.0),
    (31.0, 32.0), (22.0, 37.0), (12.0, 43.0), (11.0, 51.0), (2.0, 46.0),
    (-5.0, 39.0), (-11.0, 40.0), (-16.0, 40.0), (-20.0, 35.0), (-26.0, 33.0),
    (-34.0, 26.0), (-35.0, 20.0), (-32.0, 18.0), (-22.0, 14.0), (-17.0, 12.0),
    (-12.0, 14.0), (-6.0, 12.0), (-1.0, 9.0), (4.0, 9.0), (4.0, 6.0),
    (6.0, 1.0), (5.0, -4.0), (5.0, -8.0), (7.0, -12.0), (11.0, -15.0),
    (15.0, -17.0), (21.0, -17.0), (28.0, -13.0), (32.0, -9.0),
];

const SCANDINAVIA: &[(f64, f64)] = &[
    (56.0, 8.0), (58.0, 6.0), (62.0, 5.0), (65.0, 12.0), (69.0, 16.0),
    (71.0, 26.0), (70.0, 30.0), (66.0, 26.0), (63.0, 21.0), (60.0, 18.0),
    (56.0, 13.0),
];

const BRITAIN: &[(f64, f64)] = &[
    (50.0, -5.0), (51.0, 1.0), (53.0, 0.0), (56.0, -2.0), (58.0, -3.0),
    (58.0, -6.0), (55.0, -5.0), (53.0, -4.0), (52.0, -5.0),
];

const IRELAND: &[(f64, f64)] = &[(52.0, -10.0), (54.0, -6.0), (55.0, -8.0)];

const ICELAND: &[(f64, f64)] = &[
    (63.0, -20.0), (64.0, -14.0), (66.0, -15.0), (66.0, -23.0), (64.0, -22.0),
];

const MADAGASCAR: &[(f64, f64)] = &[
    (-12.0, 49.0), (-16.0, 50.0), (-25.0, 47.0), (-25.0, 44.0), (-17.0, 44.0),
];

const AUSTRALIA: &[(f64, f64)] = &[
    (-11.0, 142.0), (-17.0, 141.0), (-12.0, 136.0), (-12.0, 131.0), (-15.0, 129.0),
    (-14.0, 126.0), (-18.0, 122.0), (-22.0, 114.0), (-26.0, 113.0), (-32.0, 115.0),
    (-35.0, 117.0), (-34.0, 124.0), (-32.0, 131.0), (-35.0, 136.0), (-38.0, 140.0),
    (-39.0, 146.0), (-37.0, 150.0), (-33.0, 152.0), (-28.0, 153.0), (-24.0, 151.0),
    (-19.0, 147.0), (-15.0, 145.0),
];

const JAPAN: &[(f64, f64)] = &[
    (31.0, 130.0), (34.0, 131.0), (36.0, 136.0), (38.0, 139.0), (41.0, 140.0),
    (45.0, 142.0), (43.0, 145.0), (40.0, 142.0), (36.0, 140.0), (34.0, 136.0),
    (33.0, 132.0),
];

const BORNEO: &[(f64, f64)] = &[(7.0, 117.0), (1.0, 119.0), (-4.0, 116.0), (-3.0, 110.0), (2.0, 109.0)];

const SUMATRA: &[(f64, f64)] = &[(5.0, 95.0), (0.0, 104.0), (-6.0, 106.0), (-4.0, 102.0)];

const NEW_GUINEA: &[(f64, f64)] = &[
    (-1.0, 131.0), (-3.0, 141.0), (-9.0, 147.0), (-10.0, 150.0), (-8.0, 143.0),
    (-4.0, 135.0),
];

const NEW_ZEALAND: &[(f64, f64)] = &[
    (-35.0, 173.0), (-41.0, 176.0), (-46.0, 171.0), (-44.0, 168.0), (-41.0, 172.0),
];

const CUBA: &[(f64, f64)] = &[(23.0, -84.0), (23.0, -80.0), (20.0, -74.0), (20.0, -78.0), (22.0, -81.0)];

const ANTARCTICA: &[(f64, f64)] = &[
    (-70.0, -180.0), (-72.0, -100.0), (-64.0, -60.0), (-70.0, 0.0), (-67.0, 60.0),
    (-66.0, 100.0), (-66.0, 140.0), (-72.0, 170.0), (-70.0, 180.0), (-90.0, 180.0),
    (-90.0, -180.0),
];

const OUTLINES: &[&[(f64, f64)]] = &[
    NORTH_AMERICA, GREENLAND, SOUTH_AMERICA, EURASIA, AFRICA, SCANDINAVIA, BRITAIN,
    IRELAND, ICELAND, MADAGASCAR, AUSTRALIA, JAPAN, BORNEO, SUMATRA, NEW_GUINEA,
    NEW_ZEALAND, CUBA, ANTARCTICA,
];

const MASK_WIDTH: usize = 360;
const MASK_HEIGHT: usize = 180;

/// One-degree land/ocean raster built from [`OUTLINES`].
pub struct LandMask {
    cells: Vec<bool>,
}

pub static LAND: LazyLock<LandMask> = LazyLock::new(LandMask::build);

impl LandMask {
    fn build() -> Self {
        let mut cells = vec![false; MASK_WIDTH * MASK_HEIGHT];
        for row in 0..MASK_HEIGHT {
            let lat = 89.5 - row as f64;
            for col in 0..MASK_WIDTH {
                let lon = -179.5 + col as f64;
                cells[row * MASK_WIDTH + col] =
                    OUTLINES.iter().any(|ring| contains(ring, lat, lon));
            }
        }
        Self { cells }
    }

    pub fn is_land(&self, p: GeoPoint) -> bool {
        let row = ((90.0 - p.latitude()).floor() as usize).min(MASK_HEIGHT - 1);
        let col = ((p.longitude() + 180.0).floor() as usize).min(MASK_WIDTH - 1);
        self.cells[row * MASK_WIDTH + col]
    }
}

// Even-odd ray cast in the (lon, lat) plane.
fn contains(ring: &[(f64, f64)], lat: f64, lon: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (lat_i, lon_i) = ring[i];
        let (lat_j, lon_j) = ring[j];
        if (lat_i > lat) != (lat_j > lat) {
            let cross_lon = lon_i + (lat - lat_i) / (lat_j - lat_i) * (lon_j - lon_i);
            if lon < cross_lon {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

// Sunlit land: savanna green
const LAND_DAY: (f64, f64, f64) = (90.0, 200.0, 80.0);
// Sunlit ocean: deep blue
const OCEAN_DAY: (f64, f64, f64) = (30.0, 110.0, 230.0);
// Civil twilight glow along the terminator
const TWILIGHT: (f64, f64, f64) = (255.0, 140.0, 40.0);
// Night land keeps a faint city-light amber
const LAND_NIGHT: (f64, f64, f64) = (70.0, 55.0, 20.0);
const OCEAN_NIGHT: (f64, f64, f64) = (5.0, 10.0, 35.0);

/// Sun elevations below this (as a sine) still get a twilight tint.
const TWILIGHT_BAND: f64 = 0.1;

fn rgb(c: (f64, f64, f64), k: f64) -> Color {
    let k = k.clamp(0.0, 1.0);
    Color::Rgb((c.0 * k) as u8, (c.1 * k) as u8, (c.2 * k) as u8)
}

fn mix(a: (f64, f64, f64), b: (f64, f64, f64), t: f64) -> (f64, f64, f64) {
    let t = t.clamp(0.0, 1.0);
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

/// Glyph and colour for a surface cell with Lambert factor `illumination`
/// (cosine of the solar zenith angle).
pub fn get_appearance(is_land: bool, illumination: f64) -> (char, Color) {
    let (day, night) = if is_land {
        (LAND_DAY, LAND_NIGHT)
    } else {
        (OCEAN_DAY, OCEAN_NIGHT)
    };

    if illumination.abs() < TWILIGHT_BAND {
        // 0 at the edge of the band, 1 on the terminator itself
        let glow = 1.0 - illumination.abs() / TWILIGHT_BAND;
        let base = if illumination >= 0.0 { day } else { night };
        let ch = if is_land { '▓' } else { '·' };
        return (ch, rgb(mix(base, TWILIGHT, glow * 0.6), 0.7));
    }

    if illumination > 0.0 {
        let i = 0.35 + illumination * 0.65;
        let ch = if is_land {
            '█'
        } else if i > 0.85 {
            '≈'
        } else if i > 0.6 {
            '~'
        } else {
            '-'
        };
        (ch, rgb(day, i))
    } else {
        let ch = if is_land { '▒' } else { ' ' };
        let fade = 1.0 - (-illumination).min(1.0) * 0.4;
        (ch, rgb(night, fade))
    }
}
