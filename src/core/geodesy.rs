/// Reference ellipsoid, with ECEF / geodetic conversion, local
/// East/North/Up frames and the directional radius of curvature used as
/// the SCH peg radius
#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    /// Semi-major axis in meters
    pub a: f64,
    /// First eccentricity squared
    pub e2: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Ellipsoid {
    /// WGS-84, as used for Earth by ISCE
    pub fn wgs84() -> Self {
        Self {
            a: 6_378_137.0,
            e2: 0.0066943799901,
        }
    }

    /// ECEF position to [latitude (deg), longitude (deg), height (m)].
    ///
    /// Closed-form solution (Vermeille 2002), no iteration.
    pub fn xyz_to_llh(&self, xyz: [f64; 3]) -> [f64; 3] {
        let [x, y, z] = xyz;
        let a2 = self.a * self.a;
        let e4 = self.e2 * self.e2;

        let p = (x * x + y * y) / a2;
        let q = (1.0 - self.e2) / a2 * z * z;
        let r = (p + q - e4) / 6.0;
        let s = e4 * p * q / (4.0 * r.powi(3));
        let t = (1.0 + s + (s * (2.0 + s)).sqrt()).cbrt();
        let u = r * (1.0 + t + 1.0 / t);
        let v = (u * u + e4 * q).sqrt();
        let w = self.e2 * (u + v - q) / (2.0 * v);
        let k = (u + v + w * w).sqrt() - w;
        let d = k * (x * x + y * y).sqrt() / (k + self.e2);

        let lat = z.atan2(d);
        let lon = y.atan2(x);
        let height = (k + self.e2 - 1.0) / k * (d * d + z * z).sqrt();
        [lat.to_degrees(), lon.to_degrees(), height]
    }

    /// Geodetic coordinates back to ECEF
    pub fn llh_to_xyz(&self, llh: [f64; 3]) -> [f64; 3] {
        let lat = llh[0].to_radians();
        let lon = llh[1].to_radians();
        let re = self.east_radius(lat);
        [
            (re + llh[2]) * lat.cos() * lon.cos(),
            (re + llh[2]) * lat.cos() * lon.sin(),
            (re * (1.0 - self.e2) + llh[2]) * lat.sin(),
        ]
    }

    /// Prime vertical radius of curvature (lat in radians)
    fn east_radius(&self, lat: f64) -> f64 {
        self.a / (1.0 - self.e2 * lat.sin().powi(2)).sqrt()
    }

    /// Meridional radius of curvature (lat in radians)
    fn north_radius(&self, lat: f64) -> f64 {
        self.a * (1.0 - self.e2) / (1.0 - self.e2 * lat.sin().powi(2)).powf(1.5)
    }

    /// Radius of curvature along `heading_deg` at `lat_deg`.
    ///
    /// This is the peg radius of an SCH frame placed at that point and
    /// heading.
    pub fn radius_of_curvature(&self, lat_deg: f64, heading_deg: f64) -> f64 {
        let lat = lat_deg.to_radians();
        let hdg = heading_deg.to_radians();
        let re = self.east_radius(lat);
        let rn = self.north_radius(lat);
        (re * rn) / (re * hdg.cos().powi(2) + rn * hdg.sin().powi(2))
    }

    /// Unit East, North, Up vectors in ECEF at the given geodetic point
    pub fn enu_basis(&self, lat_deg: f64, lon_deg: f64) -> [[f64; 3]; 3] {
        let (slat, clat) = lat_deg.to_radians().sin_cos();
        let (slon, clon) = lon_deg.to_radians().sin_cos();
        [
            [-slon, clon, 0.0],
            [-slat * clon, -slat * slon, clat],
            [clat * clon, clat * slon, slat],
        ]
    }
}

pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}
