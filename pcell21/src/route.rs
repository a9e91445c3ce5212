//!
//! # Waypoint Router
//!
//! Plans the corner points of a path between two oriented [Port]s,
//! using as few bends as the bend radius allows.
//!
//! Planning happens in the local frame of the starting port: origin at its position,
//! heading along +x. Cases are split on the direction in which the path must arrive
//! at the destination (opposite the destination port's outward direction).
//! Axis-aligned arrivals get Manhattan-style plans with every segment long enough
//! for the arcs at its ends; any other arrival gets at most two corners.
//!

// Std-Lib
use std::f64::consts::{FRAC_PI_2, PI};

// Local imports
use crate::{
    geom::{angle_diff, Point, EPS},
    port::{Port, ANGLE_TOL},
    trace::corners,
};

/// Corner points of a path leaving `from` and arriving at `to`, both ends included,
/// in the ports' shared coordinate frame.
pub fn waypoints(from: &Port, to: &Port, bend_radius: f64) -> Vec<Point> {
    let origin = from.position();
    let heading = from.angle();
    // Destination in our local frame
    let b = (to.position() - origin).rotate(-heading);
    // Destination port's outward direction, relative to ours
    let rel = angle_diff(to.angle(), heading);
    let local = plan(b, rel, bend_radius);
    local
        .into_iter()
        .map(|p| p.rotate(heading) + origin)
        .collect()
}

/// Plan in the local frame. `b` is the destination, `rel` its relative outward angle in (-π, π].
fn plan(b: Point, rel: f64, r: f64) -> Vec<Point> {
    let near = |a: f64| angle_diff(rel, a).abs() < ANGLE_TOL;
    if near(PI) {
        arrive_forward(b, r)
    } else if near(0.) {
        arrive_backward(b, r)
    } else if near(-FRAC_PI_2) {
        arrive_up(b, r)
    } else if near(FRAC_PI_2) {
        // Mirror of arriving upward
        let mirror = |p: Point| Point::new(p.x, -p.y);
        arrive_up(mirror(b), r).into_iter().map(mirror).collect()
    } else {
        arrive_oblique(b, rel, r)
    }
}

/// Arrive travelling +x, i.e. the destination faces us
fn arrive_forward(b: Point, r: f64) -> Vec<Point> {
    let o = Point::default();
    let (bx, by) = (b.x, b.y);
    if by.abs() < EPS && bx > -EPS {
        // Straight ahead, or coincident
        return vec![o, b];
    }
    if bx >= 2. * r - EPS && by.abs() >= 2. * r - EPS {
        // Two 90-degree bends
        return vec![o, Point::new(bx / 2., 0.), Point::new(bx / 2., by), b];
    }
    if by.abs() < 2. * r {
        // Shallow S: two equal and opposite bends, touching along the diagonal
        let phi = (1. - by.abs() / (2. * r)).acos();
        let t = r * (phi / 2.).tan();
        let dx = 2. * t * phi.cos();
        let a = (bx - dx) / 2.;
        if a >= t - EPS {
            return vec![o, Point::new(a, 0.), Point::new(a + dx, by), b];
        }
    }
    // Loop around: out past the destination, across, back, and in
    let xo = r + bx.max(0.);
    let ym = if by.abs() >= 4. * r {
        by / 2.
    } else if by >= 0. {
        by + 2. * r
    } else {
        by - 2. * r
    };
    vec![
        o,
        Point::new(xo, 0.),
        Point::new(xo, ym),
        Point::new(bx - r, ym),
        Point::new(bx - r, by),
        b,
    ]
}

/// Arrive travelling -x, i.e. the destination points the same way we do
fn arrive_backward(b: Point, r: f64) -> Vec<Point> {
    let o = Point::default();
    let (bx, by) = (b.x, b.y);
    if by.abs() >= 2. * r - EPS {
        // U-turn
        let x = bx.max(0.) + r;
        return vec![o, Point::new(x, 0.), Point::new(x, by), b];
    }
    // Step aside first, then U-turn back
    let x = (3. * r).max(bx + r);
    let ym = if by >= 0. { by + 2. * r } else { by - 2. * r };
    vec![
        o,
        Point::new(r, 0.),
        Point::new(r, ym),
        Point::new(x, ym),
        Point::new(x, by),
        b,
    ]
}

/// Arrive travelling +y
fn arrive_up(b: Point, r: f64) -> Vec<Point> {
    let o = Point::default();
    let (bx, by) = (b.x, b.y);
    if bx >= r - EPS && by >= r - EPS {
        // Single bend
        return vec![o, Point::new(bx, 0.), b];
    }
    if bx <= -r + EPS && by >= 3. * r - EPS {
        // Up, back over our own start, and up again
        let ym = 2. * r;
        return vec![o, Point::new(r, 0.), Point::new(r, ym), Point::new(bx, ym), b];
    }
    // Dive below both ends, cross over, and come up
    let xm = if bx >= 3. * r {
        r
    } else if bx >= -r {
        bx + 2. * r
    } else {
        r
    };
    let y1 = by.min(0.) - 2. * r;
    vec![
        o,
        Point::new(xm, 0.),
        Point::new(xm, y1),
        Point::new(bx, y1),
        b,
    ]
}

/// Arrive at an arbitrary angle.
///
/// Candidates, in order of preference: the meeting point of the two ports' rays
/// (one bend); straight stubs out of both ports, joined directly (two bends);
/// a Manhattan plan to a point on the destination's ray, finished by one bend of
/// at most 45 degrees. The first candidate which fits the bend radius is returned,
/// else the stubs, for the path template to reject.
fn arrive_oblique(b: Point, rel: f64, r: f64) -> Vec<Point> {
    let o = Point::default();
    let da = Point::new(1., 0.);
    let ub = Point::unit(rel);
    // Solve s * da = b + t * ub, for the meeting point of the two rays
    let denom = da.cross(&ub);
    if denom.abs() > EPS {
        let s = b.cross(&ub) / denom;
        let t = b.cross(&da) / denom;
        let pts = vec![o, da * s, b];
        if s > EPS && t > EPS && fits(&pts, r) {
            return pts;
        }
    }
    let stubs = vec![o, da * (2. * r), b + ub * (2. * r), b];
    if fits(&stubs, r) {
        return stubs;
    }
    // Nearest axis-aligned arrival
    let snapped = (rel / FRAC_PI_2).round() * FRAC_PI_2;
    for reach in [1., 2., 4.] {
        let q = b + ub * (reach * r);
        for scale in [1., 2.] {
            let mut pts = plan(q, angle_diff(snapped, 0.), scale * r);
            pts.push(b);
            if fits(&pts, r) {
                return pts;
            }
        }
    }
    stubs
}

/// Boolean indication of whether `pts` can be followed with bends of radius `r`
fn fits(pts: &[Point], r: f64) -> bool {
    corners(pts, r).is_ok()
}
