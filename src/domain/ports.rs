use crate::domain::model::CenterDay;
use crate::utils::error::Result;
use chrono::NaiveDate;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

/// 三段式工作：讀入、計算、輸出
pub trait Job {
    type Input;
    type Output;

    fn name(&self) -> &str;
    fn extract(&self) -> Result<Self::Input>;
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
    /// 回傳輸出位置
    fn load(&self, output: Self::Output) -> Result<String>;
}

pub trait CenterLookup {
    fn center_day(&self, location: &str, date: NaiveDate) -> Option<&CenterDay>;
}

/// 對一組資料執行某種分析，執行後由呼叫端標記完成
pub trait Analysis {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn load_data(&mut self, data: Vec<i64>);
    fn run(&mut self) -> Result<()>;
    fn is_complete(&self) -> bool;
    fn set_complete(&mut self, status: bool);
    fn results(&self) -> Option<String>;

    fn details(&self) -> &str {
        self.description()
    }

    fn render(&self) -> String {
        let desc = if self.description().is_empty() {
            " ".to_string()
        } else {
            format!(" ({}) ", self.description())
        };
        format!(
            "Analysis {}{}\n{}\n{}",
            self.name(),
            desc,
            self.results().unwrap_or_else(|| "None".to_string()),
            "-".repeat(5)
        )
    }
}
