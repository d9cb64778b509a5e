//! GF(2^8) arithmetic
//!
//! Field generated by x^8 + x^4 + x^3 + x^2 + 1 (0x11D) with generator 2.
//! Log/exp tables are computed at compile time.
// Copyright 2025 Francisco F. Pinochet
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


const POLY: u16 = 0x11D;

struct Tables {
    // doubled so that log(a) + log(b) never needs a modulo
    exp: [u8; 512],
    log: [u8; 256],
}

const fn build_tables() -> Tables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];

    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= POLY;
        }
        i += 1;
    }
    while i < 512 {
        exp[i] = exp[i - 255];
        i += 1;
    }

    Tables { exp, log }
}

static TABLES: Tables = build_tables();

/// Field multiplication
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    TABLES.exp[TABLES.log[a as usize] as usize + TABLES.log[b as usize] as usize]
}

/// Multiplicative inverse. `a` must be non-zero.
#[inline]
pub fn inv(a: u8) -> u8 {
    assert!(a != 0, "gf256: inverse of zero");
    TABLES.exp[255 - TABLES.log[a as usize] as usize]
}

/// Field division. `b` must be non-zero.
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    assert!(b != 0, "gf256: division by zero");
    if a == 0 {
        return 0;
    }
    TABLES.exp[TABLES.log[a as usize] as usize + 255 - TABLES.log[b as usize] as usize]
}

/// `dst += c * src`, element-wise over the shorter of the two slices
pub fn mul_add_slice(dst: &mut [u8], src: &[u8], c: u8) {
    match c {
        0 => {}
        1 => {
            for (d, s) in dst.iter_mut().zip(src) {
                *d ^= *s;
            }
        }
        _ => {
            let log_c = TABLES.log[c as usize] as usize;
            for (d, s) in dst.iter_mut().zip(src) {
                if *s != 0 {
                    *d ^= TABLES.exp[TABLES.log[*s as usize] as usize + log_c];
                }
            }
        }
    }
}

/// `buf *= c`, element-wise
pub fn mul_slice(buf: &mut [u8], c: u8) {
    match c {
        0 => buf.fill(0),
        1 => {}
        _ => {
            let log_c = TABLES.log[c as usize] as usize;
            for b in buf.iter_mut() {
                if *b != 0 {
                    *b = TABLES.exp[TABLES.log[*b as usize] as usize + log_c];
                }
            }
        }
    }
}
