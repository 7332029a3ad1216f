// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Arbitrary-precision amount helpers shared by the matcher, summarizer and apportioner.

use alloy_primitives::{U256, U512};

/// Decimal precision of the native staking token.
pub const NATIVE_DECIMALS: u8 = 18;

/// Format a base-unit amount as a decimal string with `decimals` fractional digits.
///
/// Trailing zeros in the fractional part are trimmed, and the decimal point is omitted for whole
/// amounts, e.g. `1500000000000000000` with 18 decimals formats as `"1.5"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / divisor;
    let fraction = value % divisor;
    if fraction.is_zero() {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Format a base-unit amount of the native token (18 decimals).
pub fn format_ether(value: U256) -> String {
    format_units(value, NATIVE_DECIMALS)
}

fn widen(value: U256) -> U512 {
    let l = value.as_limbs();
    U512::from_limbs([l[0], l[1], l[2], l[3], 0, 0, 0, 0])
}

/// Compute `floor(a * b / denominator)` exactly, using a 512-bit intermediate product.
///
/// Returns `None` if the denominator is zero or the quotient does not fit in 256 bits.
pub fn mul_div_floor(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let quotient = (widen(a) * widen(b)) / widen(denominator);
    let l = quotient.as_limbs();
    if l[4..].iter().any(|limb| *limb != 0) {
        return None;
    }
    Some(U256::from_limbs([l[0], l[1], l[2], l[3]]))
}

/// Express `part / total` as a percentage in `[0, 100]` with six decimal digits of precision.
///
/// Display only; amounts are never scaled through this value. A zero total yields `0.0`.
pub fn ratio_percent(part: U256, total: U256) -> f64 {
    const SCALE: u64 = 1_000_000;
    let Some(scaled) = mul_div_floor(part, U256::from(100 * SCALE), total) else {
        return 0.0;
    };
    scaled.min(U256::from(u64::MAX)).to::<u64>() as f64 / SCALE as f64
}

/// Serde adapter rendering U256 amounts as decimal strings.
pub mod decimal {
    use std::str::FromStr;

    use alloy_primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str(&s).map_err(de::Error::custom)
    }
}
