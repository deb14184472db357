use crate::core::geodesy::{dot, Ellipsoid};
use crate::io::isce_xml::Component;
use crate::types::{OrbitData, PrepError, PrepResult, StateVector};
use chrono::NaiveDateTime;

/// Number of state vectors used for each interpolation
const INTERPOLATION_POINTS: usize = 4;

/// Orbit reader and interpolator for ISCE orbit components
pub struct OrbitReader;

/// Signed seconds from `origin` to `time`
pub fn seconds_between(time: NaiveDateTime, origin: NaiveDateTime) -> f64 {
    let delta = time - origin;
    match delta.num_microseconds() {
        Some(us) => us as f64 * 1e-6,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}

impl OrbitReader {
    /// Collect the state vectors of an ISCE orbit component.
    ///
    /// Any component below `orbit` that carries `time`, `position` and
    /// `velocity` properties is taken as a state vector.
    pub fn from_component(orbit: &Component) -> PrepResult<OrbitData> {
        let mut state_vectors = Vec::new();
        for node in orbit.descendants() {
            if !(node.has_property("time")
                && node.has_property("position")
                && node.has_property("velocity"))
            {
                continue;
            }
            state_vectors.push(StateVector {
                time: node.get_datetime("time")?,
                position: node.get_vector3("position")?,
                velocity: node.get_vector3("velocity")?,
            });
        }

        if state_vectors.is_empty() {
            return Err(PrepError::Metadata(format!(
                "No state vectors found in orbit component '{}'",
                orbit.name
            )));
        }

        state_vectors.sort_by_key(|sv| sv.time);
        log::debug!(
            "Read {} state vectors from {} to {}",
            state_vectors.len(),
            state_vectors[0].time,
            state_vectors[state_vectors.len() - 1].time
        );
        Ok(OrbitData { state_vectors })
    }

    /// Hermite interpolation of position and velocity at `target_time`
    pub fn interpolate(
        orbit: &OrbitData,
        target_time: NaiveDateTime,
    ) -> PrepResult<([f64; 3], [f64; 3])> {
        let selected = Self::find_interpolation_vectors(&orbit.state_vectors, target_time)?;
        let first = selected[0].time;
        let last = selected[selected.len() - 1].time;
        if target_time < first || target_time > last {
            log::warn!(
                "Interpolation time {} outside state vector span {} .. {}",
                target_time,
                first,
                last
            );
        }
        Ok(Self::hermite_interpolate(&selected, target_time))
    }

    /// Satellite heading in degrees clockwise from north, from the
    /// interpolated velocity in the local East/North/Up frame
    pub fn enu_heading(orbit: &OrbitData, target_time: NaiveDateTime) -> PrepResult<f64> {
        let (position, velocity) = Self::interpolate(orbit, target_time)?;
        let elp = Ellipsoid::wgs84();
        let llh = elp.xyz_to_llh(position);
        let [east, north, _up] = elp.enu_basis(llh[0], llh[1]);
        let v_east = dot(&east, &velocity);
        let v_north = dot(&north, &velocity);
        Ok(v_east.atan2(v_north).to_degrees())
    }

    /// Pick up to four state vectors surrounding the target time, half
    /// before and half after it. Near either end of the orbit the window
    /// is shifted inwards.
    fn find_interpolation_vectors(
        state_vectors: &[StateVector],
        target_time: NaiveDateTime,
    ) -> PrepResult<Vec<&StateVector>> {
        if state_vectors.is_empty() {
            return Err(PrepError::Processing(
                "No state vectors available".to_string(),
            ));
        }

        let num_points = std::cmp::min(INTERPOLATION_POINTS, state_vectors.len());
        if num_points < 2 {
            return Err(PrepError::Processing(format!(
                "At least 2 state vectors are required for interpolation, found {}",
                state_vectors.len()
            )));
        }

        // first vector strictly after the target
        let after_idx = state_vectors.partition_point(|sv| sv.time <= target_time);
        let start_idx = std::cmp::min(
            after_idx.saturating_sub(num_points / 2),
            state_vectors.len() - num_points,
        );

        Ok(state_vectors[start_idx..start_idx + num_points].iter().collect())
    }

    /// Hermite interpolation using positions and velocities of every
    /// selected vector. Returns (position, velocity).
    fn hermite_interpolate(
        state_vectors: &[&StateVector],
        target_time: NaiveDateTime,
    ) -> ([f64; 3], [f64; 3]) {
        let origin = state_vectors[0].time;
        let times: Vec<f64> = state_vectors
            .iter()
            .map(|sv| seconds_between(sv.time, origin))
            .collect();
        let x = seconds_between(target_time, origin);
        let n = times.len();

        let mut position = [0.0; 3];
        let mut velocity = [0.0; 3];

        for i in 0..n {
            let ti = times[i];

            // Lagrange basis, its derivative at x, and its derivative at ti
            let mut li = 1.0;
            let mut dli = 0.0;
            let mut ci = 0.0;
            for k in 0..n {
                if k == i {
                    continue;
                }
                li *= (x - times[k]) / (ti - times[k]);
                ci += 1.0 / (ti - times[k]);

                let mut term = 1.0 / (ti - times[k]);
                for j in 0..n {
                    if j != i && j != k {
                        term *= (x - times[j]) / (ti - times[j]);
                    }
                }
                dli += term;
            }

            let dx = x - ti;
            let li2 = li * li;
            let h = (1.0 - 2.0 * ci * dx) * li2;
            let k = dx * li2;
            let dh = -2.0 * ci * li2 + (1.0 - 2.0 * ci * dx) * 2.0 * li * dli;
            let dk = li2 + dx * 2.0 * li * dli;

            let sv = state_vectors[i];
            for coord in 0..3 {
                position[coord] += h * sv.position[coord] + k * sv.velocity[coord];
                velocity[coord] += dh * sv.position[coord] + dk * sv.velocity[coord];
            }
        }

        log::debug!("Interpolated position at {}: {:?}", target_time, position);
        (position, velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, 2)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap()
    }

    /// Cubic trajectory: Hermite on 4 points reproduces it exactly.
    fn cubic_orbit() -> OrbitData {
        let state_vectors = (0..6)
            .map(|i| {
                let s = i as f64 * 10.0;
                StateVector {
                    time: t0() + Duration::seconds(i * 10),
                    position: [1.0e6 + 7000.0 * s, 2.0 * s * s, 0.01 * s * s * s],
                    velocity: [7000.0, 4.0 * s, 0.03 * s * s],
                }
            })
            .collect();
        OrbitData { state_vectors }
    }

    #[test]
    fn test_hermite_reproduces_cubic() {
        let orbit = cubic_orbit();
        let s = 23.5;
        let t = t0() + Duration::milliseconds(23_500);
        let (pos, vel) = OrbitReader::interpolate(&orbit, t).unwrap();

        assert_relative_eq!(pos[0], 1.0e6 + 7000.0 * s, epsilon = 1e-4);
        assert_relative_eq!(pos[1], 2.0 * s * s, epsilon = 1e-4);
        assert_relative_eq!(pos[2], 0.01 * s * s * s, epsilon = 1e-4);
        assert_relative_eq!(vel[0], 7000.0, epsilon = 1e-6);
        assert_relative_eq!(vel[1], 4.0 * s, epsilon = 1e-6);
        assert_relative_eq!(vel[2], 0.03 * s * s, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolation_at_node_returns_node() {
        let orbit = cubic_orbit();
        let sv = &orbit.state_vectors[3];
        let (pos, vel) = OrbitReader::interpolate(&orbit, sv.time).unwrap();
        for c in 0..3 {
            assert_relative_eq!(pos[c], sv.position[c], epsilon = 1e-6);
            assert_relative_eq!(vel[c], sv.velocity[c], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_heading_of_northbound_satellite() {
        // Over the equator at lon 0, moving along +z (north) and +y (east).
        let orbit = OrbitData {
            state_vectors: (0..4)
                .map(|i| StateVector {
                    time: t0() + Duration::seconds(i),
                    position: [7.0e6, 100.0 * i as f64, 7000.0 * i as f64],
                    velocity: [0.0, 100.0, 7000.0],
                })
                .collect(),
        };
        let heading = OrbitReader::enu_heading(&orbit, t0() + Duration::milliseconds(1500)).unwrap();
        assert_relative_eq!(heading, (100.0f64).atan2(7000.0).to_degrees(), epsilon = 1e-3);
    }

    fn selected_offsets(orbit: &OrbitData, t: NaiveDateTime) -> Vec<i64> {
        OrbitReader::find_interpolation_vectors(&orbit.state_vectors, t)
            .unwrap()
            .iter()
            .map(|sv| (sv.time - t0()).num_seconds())
            .collect()
    }

    #[test]
    fn test_interpolation_vectors_surround_target() {
        let orbit = OrbitData {
            state_vectors: (0..7)
                .map(|i| StateVector {
                    time: t0() + Duration::seconds(i * 10),
                    position: [0.0; 3],
                    velocity: [0.0; 3],
                })
                .collect(),
        };

        // just past a node: two before, two after
        assert_eq!(selected_offsets(&orbit, t0() + Duration::seconds(21)), vec![10, 20, 30, 40]);
        assert_eq!(selected_offsets(&orbit, t0() + Duration::seconds(29)), vec![10, 20, 30, 40]);

        // window shifted inwards at both ends
        assert_eq!(selected_offsets(&orbit, t0() + Duration::seconds(3)), vec![0, 10, 20, 30]);
        assert_eq!(selected_offsets(&orbit, t0() + Duration::seconds(58)), vec![30, 40, 50, 60]);
        assert_eq!(selected_offsets(&orbit, t0() + Duration::seconds(90)), vec![30, 40, 50, 60]);
    }

    #[test]
    fn test_single_state_vector_is_error() {
        let orbit = OrbitData {
            state_vectors: vec![StateVector {
                time: t0(),
                position: [7.0e6, 0.0, 0.0],
                velocity: [0.0, 0.0, 7500.0],
            }],
        };
        assert!(OrbitReader::interpolate(&orbit, t0()).is_err());
    }

    #[test]
    fn test_empty_orbit_is_error() {
        let orbit = OrbitData::default();
        assert!(OrbitReader::interpolate(&orbit, t0()).is_err());
    }

    #[test]
    fn test_state_vectors_from_component() {
        let xml = r#"<component name="orbit">
            <property name="referenceFrame"><value>ECR</value></property>
            <component name="state_vectors">
                <component name="statevector2">
                    <property name="time"><value>2017-01-02 13:00:10</value></property>
                    <property name="position"><value>[3.0, 4.0, 5.0]</value></property>
                    <property name="velocity"><value>[0.1, 0.2, 0.3]</value></property>
                </component>
                <component name="statevector1">
                    <property name="time"><value>2017-01-02 13:00:00</value></property>
                    <property name="position"><value>[0.0, 1.0, 2.0]</value></property>
                    <property name="velocity"><value>[0.1, 0.2, 0.3]</value></property>
                </component>
            </component>
        </component>"#;
        let orbit = OrbitReader::from_component(&Component::parse(xml).unwrap()).unwrap();
        assert_eq!(orbit.state_vectors.len(), 2);
        assert_eq!(orbit.state_vectors[0].time, t0());
        assert_eq!(orbit.state_vectors[1].position, [3.0, 4.0, 5.0]);
    }
}
