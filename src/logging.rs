use std::io::Write;

use env_logger;

#[allow(unused_must_use)]
pub fn init_logger(test_mode: bool) {
    env_logger::builder()
        .format(|buf, record| writeln!(buf,
                                       "[{} {} {}] {}",
                                       buf.timestamp_millis(),
                                       record.level(),
                                       record.target(),
                                       record.args()))
        .is_test(test_mode)
        .try_init();
}
