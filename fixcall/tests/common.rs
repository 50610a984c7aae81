#![allow(dead_code)]

pub fn init_trace() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn add1(x: i32) -> i32 {
    x + 1
}

pub fn add_base(base: &mut i32, x: i32) -> i32 {
    *base + x
}

#[derive(Debug, Default)]
pub struct Counter {
    pub n: i32,
}

impl Counter {
    pub fn bump(&mut self) -> i32 {
        self.n += 1;
        self.n
    }

    pub fn bump_by(&mut self, step: &mut i32) -> i32 {
        self.n += *step;
        *step += 1;
        self.n
    }
}

/// Records every event it receives.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<(u8, u16)>,
}

impl Recorder {
    pub fn record(&mut self, id: u8, value: u16) {
        self.events.push((id, value));
    }

    pub fn record_tagged(&mut self, tag: &mut &'static str, id: u8, value: u16) {
        *tag = "recorded";
        self.events.push((id, value));
    }
}
