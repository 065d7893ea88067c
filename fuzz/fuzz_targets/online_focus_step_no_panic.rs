// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

use focus_core::TriggerAlgorithm;
use focus_online::{ConstantConfig, ConstantFocus, DesConfig, DesFocus, Focus, FocusConfig};
use libfuzzer_sys::fuzz_target;

struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next_u8(&mut self) -> u8 {
        let byte = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos = self.pos.wrapping_add(1);
        byte
    }

    fn next_u16(&mut self) -> u16 {
        u16::from_le_bytes([self.next_u8(), self.next_u8()])
    }
}

fn bounded(seed: u8, min: usize, max: usize) -> usize {
    min + usize::from(seed) % (max - min + 1)
}

enum Algo {
    Raw(Focus),
    Constant(ConstantFocus),
    Des(DesFocus),
}

fn build(cursor: &mut ByteCursor<'_>) -> Option<Algo> {
    let threshold_std = 1.0 + f64::from(cursor.next_u8() % 64) / 4.0;
    let mu_min = 1.0 + f64::from(cursor.next_u8() % 32) / 8.0;

    match cursor.next_u8() % 3 {
        0 => Focus::new(FocusConfig {
            threshold_std,
            mu_min,
        })
        .ok()
        .map(Algo::Raw),
        1 => ConstantFocus::new(ConstantConfig {
            background: 0.125 + f64::from(cursor.next_u8()) / 16.0,
            threshold_std,
            mu_min,
            skip: bounded(cursor.next_u8(), 0, 32),
        })
        .ok()
        .map(Algo::Constant),
        _ => {
            let m = bounded(cursor.next_u8(), 1, 16);
            DesFocus::new(DesConfig {
                threshold_std,
                alpha: f64::from(cursor.next_u8() % 128) / 127.0,
                beta: f64::from(cursor.next_u8() % 128) / 127.0,
                m,
                mu_min,
                t_max: match cursor.next_u8() % 3 {
                    0 => None,
                    _ => Some(bounded(cursor.next_u8(), 1, 64)),
                },
                sleep: Some(m + bounded(cursor.next_u8(), 1, 48)),
                s_0: match cursor.next_u8() % 2 {
                    0 => None,
                    _ => Some(0.25 + f64::from(cursor.next_u8()) / 16.0),
                },
                b_0: None,
            })
            .ok()
            .map(Algo::Des)
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = ByteCursor::new(data);
    let Some(mut algo) = build(&mut cursor) else {
        return;
    };

    let steps = bounded(cursor.next_u8(), 1, 512);
    for _ in 0..steps {
        let op_seed = cursor.next_u8();
        if op_seed % 13 == 0 {
            match &mut algo {
                Algo::Raw(focus) => focus.reset(),
                Algo::Constant(constant) => constant.reset(),
                Algo::Des(des) => des.reset(),
            }
            continue;
        }

        let x = u64::from(cursor.next_u16()) % 4096;
        match &mut algo {
            Algo::Raw(focus) => {
                let b = f64::from(cursor.next_u16()) / 256.0;
                // Only a non-positive background may fail, and never panic.
                let result = focus.update(x, b);
                if b > 0.0 {
                    assert!(result.is_ok());
                }
            }
            Algo::Constant(constant) => {
                constant
                    .step(x)
                    .expect("constant background never becomes invalid");
            }
            Algo::Des(des) => {
                // A decaying forecast can legitimately breach the
                // background contract; it must surface as an error.
                let _ = des.step(x);
            }
        }
    }
});
