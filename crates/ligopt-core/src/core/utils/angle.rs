use std::f64::consts::PI;

const TWO_PI: f64 = 2.0 * PI;

/// Wraps `x` into the canonical torsion range [-π, π].
pub fn normalize_angle(x: &mut f64) {
    if *x > 3.0 * PI {
        let turns = ((*x - PI) / TWO_PI).ceil();
        *x -= TWO_PI * turns;
        normalize_angle(x);
    } else if *x < -3.0 * PI {
        let turns = ((-*x - PI) / TWO_PI).ceil();
        *x += TWO_PI * turns;
        normalize_angle(x);
    } else if *x > PI {
        *x -= TWO_PI;
    } else if *x < -PI {
        *x += TWO_PI;
    }
}

#[inline]
pub fn normalized_angle(mut x: f64) -> f64 {
    normalize_angle(&mut x);
    x
}
