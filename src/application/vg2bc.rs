//! van Genuchten to Brooks-Corey parameter conversion.
//!
//! Maps the van Genuchten shape parameters `(alpha, n)` to an equivalent
//! Brooks-Corey pair `(saturated matric suction, lambda)`. The pore size
//! index comes from the closed form the simulator itself uses,
//!
//! ```text
//! lambda = (n - 1) * (1 - 0.5^(n / (n - 1)))
//! ```
//!
//! and the air entry suction pins both curves at the Lenhard et al. (1989)
//! matching saturation `s_x = 0.72 - 0.35 exp(-n^4)`.

use crate::application::error::{ApplicationError, ApplicationResult};

/// Brooks-Corey curve parameters matched to a van Genuchten curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrooksCorey {
    /// Saturated matric suction (air entry pressure) [Pa]
    pub saturated_suction: f64,
    /// Pore size distribution index lambda [-]
    pub lambda: f64,
}

/// Convert van Genuchten `(alpha, n)` to Brooks-Corey parameters.
///
/// Requires `alpha > 0` and `n > 1`. Values of `n` so close to 1 that the
/// curve match degenerates are rejected rather than returning zeros or NaN.
pub fn vg_to_bc(alpha: f64, n: f64) -> ApplicationResult<BrooksCorey> {
    if !alpha.is_finite() || alpha <= 0.0 {
        return Err(invalid("van Genuchten alpha [Pa^-1]", "must be positive and finite", alpha));
    }
    if !n.is_finite() || n <= 1.0 {
        return Err(invalid("van Genuchten n [-]", "must be greater than 1", n));
    }

    let m = 1.0 - 1.0 / n;
    let lambda = (n - 1.0) * (1.0 - 0.5_f64.powf(n / (n - 1.0)));

    // Matching-point saturation and the van Genuchten suction there
    let s_x = 0.72 - 0.35 * (-n.powi(4)).exp();
    let suction_x = (s_x.powf(-1.0 / m) - 1.0).powf(1.0 / n) / alpha;
    let saturated_suction = s_x.powf(1.0 / lambda) * suction_x;

    if !saturated_suction.is_finite()
        || saturated_suction <= 0.0
        || !lambda.is_finite()
        || lambda <= 0.0
    {
        return Err(invalid(
            "van Genuchten n [-]",
            "yields a degenerate Brooks-Corey curve",
            n,
        ));
    }
    Ok(BrooksCorey {
        saturated_suction,
        lambda,
    })
}

/// Derive van Genuchten `n` from `m` via `n = 1 / (1 - m)`.
///
/// `m` must lie strictly inside `(0, 1)`; that keeps the denominator away
/// from zero.
pub fn n_from_m(m: f64) -> ApplicationResult<f64> {
    if !m.is_finite() || m <= 0.0 || m >= 1.0 {
        return Err(invalid(
            "van Genuchten m [-]",
            "must lie strictly between 0 and 1",
            m,
        ));
    }
    Ok(1.0 / (1.0 - m))
}

fn invalid(name: &str, message: &str, value: f64) -> ApplicationError {
    ApplicationError::InvalidParameter {
        name: name.to_string(),
        message: format!("{message}, got {value:?}"),
    }
}
