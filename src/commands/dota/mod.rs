mod gold;
mod help;
mod opendota;
mod quiz;

use crate::{Data, Error};

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        help::help(),
        quiz::quiz(),
        gold::gold(),
        gold::top(),
        opendota::opendota_id(),
    ]
}
