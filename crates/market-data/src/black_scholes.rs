use common::{Greeks, OptionType};
use std::f64::consts::PI;

/// Inputs to a single Black-Scholes evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSInputs {
    pub spot: f64,
    pub strike: f64,
    /// Time to expiry in years
    pub time: f64,
    /// Implied volatility as a decimal
    pub vol: f64,
    /// Continuously-compounded risk-free rate
    pub rate: f64,
    pub option_type: OptionType,
}

pub fn norm_pdf(x: f64) -> f64 {
    (1.0 / (2.0 * PI).sqrt()) * (-0.5 * x * x).exp()
}

/// Standard normal CDF, Abramowitz-Stegun 26.2.17
pub fn norm_cdf(x: f64) -> f64 {
    let k = 1.0 / (1.0 + 0.2316419 * x.abs());
    let poly = k * (0.319381530
        + k * (-0.356563782 + k * (1.781477937 + k * (-1.821255978 + k * 1.330274429))));

    let approx = 1.0 - norm_pdf(x) * poly;

    if x >= 0.0 {
        approx
    } else {
        1.0 - approx
    }
}

pub fn d1_d2(input: &BSInputs) -> (f64, f64) {
    let vol_sqrt_t = input.vol * input.time.sqrt();
    let d1 = ((input.spot / input.strike).ln()
        + (input.rate + 0.5 * input.vol * input.vol) * input.time)
        / vol_sqrt_t;

    (d1, d1 - vol_sqrt_t)
}

/// Black-Scholes Greeks.
///
/// Returns all zeros when `time <= 0` or `vol <= 0`. Inputs are not clamped,
/// so non-finite values flow through to the result.
///
/// Theta is per calendar day and vega per volatility point. Put rho is
/// `K·T·e^(-rT)·Φ(-d2)` while call rho uses `Φ(d1)`.
pub fn black_scholes_greeks(input: BSInputs) -> Greeks {
    if input.time <= 0.0 || input.vol <= 0.0 {
        return Greeks::zero();
    }

    let (d1, d2) = d1_d2(&input);
    let s = input.spot;
    let k = input.strike;
    let t = input.time;
    let v = input.vol;
    let r = input.rate;

    let pdf = norm_pdf(d1);
    let sqrt_t = t.sqrt();
    let discounted_strike = k * (-r * t).exp();

    let delta = match input.option_type {
        OptionType::Call => norm_cdf(d1),
        OptionType::Put => norm_cdf(d1) - 1.0,
    };

    let gamma = pdf / (s * v * sqrt_t);

    let vega = 0.01 * s * pdf * sqrt_t;

    let carry = match input.option_type {
        OptionType::Call => norm_cdf(d2),
        OptionType::Put => norm_cdf(-d2),
    };
    let theta = (-(s * pdf * v) / (2.0 * sqrt_t) - r * discounted_strike * carry) / 365.0;

    let rho = match input.option_type {
        OptionType::Call => discounted_strike * t * norm_cdf(d1),
        OptionType::Put => discounted_strike * t * norm_cdf(-d2),
    };

    Greeks {
        delta,
        gamma,
        theta,
        vega,
        rho,
    }
}
