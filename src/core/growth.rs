use super::types::{CalculationMethod, GrowthPoint, MarketProfile};

/// Source of uniform draws on `[0, 1)` for the stochastic projection.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

/// Xorshift generator; seeded through splitmix64 so nearby seeds diverge.
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        let mixed = splitmix64(seed);
        let state = if mixed == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            mixed
        };
        Self { state }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>())
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

impl UniformSource for Rng {
    fn next_uniform(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        (self.next_u64() >> 11) as f64 / DENOM
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Runs the balance recurrence with a per-year return supplied by `next_return`.
fn compound<F>(initial_balance: f64, annual_contribution: f64, years: u32, mut next_return: F) -> Vec<GrowthPoint>
where
    F: FnMut() -> f64,
{
    let mut points = Vec::with_capacity(years as usize);
    let mut balance = initial_balance;
    for year_index in 1..=years {
        balance = balance * (1.0 + next_return()) + annual_contribution;
        points.push(GrowthPoint {
            year_index,
            balance,
        });
    }
    points
}

pub fn project_deterministic(
    initial_balance: f64,
    annual_contribution: f64,
    years: u32,
    profile: MarketProfile,
) -> Vec<GrowthPoint> {
    let mean = profile.assumptions().mean_return;
    compound(initial_balance, annual_contribution, years, || mean)
}

/// Uniform noise of half-width `volatility` around the profile mean.
pub fn project_stochastic(
    initial_balance: f64,
    annual_contribution: f64,
    years: u32,
    profile: MarketProfile,
    source: &mut dyn UniformSource,
) -> Vec<GrowthPoint> {
    let market = profile.assumptions();
    compound(initial_balance, annual_contribution, years, || {
        market.mean_return + (source.next_uniform() - 0.5) * 2.0 * market.volatility
    })
}

pub fn project(
    method: CalculationMethod,
    initial_balance: f64,
    annual_contribution: f64,
    years: u32,
    profile: MarketProfile,
    source: &mut dyn UniformSource,
) -> Vec<GrowthPoint> {
    match method {
        CalculationMethod::Deterministic => {
            project_deterministic(initial_balance, annual_contribution, years, profile)
        }
        CalculationMethod::Stochastic => {
            project_stochastic(initial_balance, annual_contribution, years, profile, source)
        }
    }
}

/// Balance carried into retirement; the initial balance when there were no growth years.
pub fn final_balance(points: &[GrowthPoint], initial_balance: f64) -> f64 {
    points.last().map_or(initial_balance, |p| p.balance)
}
