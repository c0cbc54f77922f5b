//! 积分方法
//!
//! 每种方法对应一张固定的 Butcher 表。第 `i` 级在 `t0 + c[i]·h` 处求导，
//! 中间值取 `y0 + h·a[i-1]·k[i-1]`，最终 `y1 = y0 + h·Σ b[i]·k[i]`。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegMethod {
    /// 显式 Euler，一阶
    Euler,
    /// Runge-Kutta 二阶（Heun）
    RungeKutta2,
    /// 经典四阶 Runge-Kutta
    RungeKutta4,
}

/// 只保存对角线下方一条的 `a`：每级只依赖前一级的导数。
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tableau {
    pub(crate) a: &'static [f64],
    pub(crate) b: &'static [f64],
    pub(crate) c: &'static [f64],
}

const EULER: Tableau = Tableau {
    a: &[],
    b: &[1.0],
    c: &[0.0],
};

const RUNGE_KUTTA2: Tableau = Tableau {
    a: &[1.0],
    b: &[0.5, 0.5],
    c: &[0.0, 1.0],
};

const RUNGE_KUTTA4: Tableau = Tableau {
    a: &[0.5, 0.5, 1.0],
    b: &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
    c: &[0.0, 0.5, 0.5, 1.0],
};

impl IntegMethod {
    /// 方法的阶数，也是每步求导的级数。
    pub fn order(self) -> usize {
        self.tableau().b.len()
    }

    pub(crate) fn tableau(self) -> Tableau {
        match self {
            IntegMethod::Euler => EULER,
            IntegMethod::RungeKutta2 => RUNGE_KUTTA2,
            IntegMethod::RungeKutta4 => RUNGE_KUTTA4,
        }
    }
}
