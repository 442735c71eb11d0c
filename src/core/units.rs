//! Lamport / SOL conversion for display.

pub use solana_sdk::native_token::LAMPORTS_PER_SOL;

/// Render lamports as whole SOL, trimming trailing zeros (`2`, `0.999995`).
pub fn format_sol(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let frac = lamports % LAMPORTS_PER_SOL;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:09}", frac);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
