use chrono::{DateTime, Utc};

/// 現在時刻の取得元。タイムアウト判定をテストで固定するために注入する。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 実時計
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時刻（テスト用）
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
