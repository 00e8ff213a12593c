//! 呼叫中心单日仿真
//!
//! 在事件驱动仿真器之上实现一个确定性的呼叫中心模型：
//! 共享坐席池、FIFO 队列、超过等待容忍时间的客户放弃，
//! 放弃后按重试概率（确定性抽稀）在当天或次日重试。
//! 一天结束时仍在排队的客户以及计划在次日重试的客户写入统计结果，供下一天承接。

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info};

use super::control::SimControl;
use crate::chain::{CallerOverrides, RunModel};
use crate::sim::{DAY_MILLIS, Event, RunOutcome, SimTime, Simulator, World};
use crate::stats::{CustomerStats, Statistics};

/// 放弃与重试到达之间的最短间隔
pub(crate) const MIN_RETRY_DELAY: SimTime = SimTime(1);

/// 单个客户类型的仿真参数
#[derive(Debug, Clone)]
struct CallerParams {
    service: SimTime,
    patience: SimTime,
    retry_probability: f64,
    retry_delay: SimTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Waiting,
    InService,
    Abandoned,
}

#[derive(Debug)]
struct Customer {
    caller: usize,
    arrived: SimTime,
    /// 前一天已等待的时间（毫秒）
    waited_before: u64,
    deadline: SimTime,
    status: Status,
}

/// 一个子日内的计数器
#[derive(Debug, Default)]
struct Counters {
    arrivals: u64,
    served: u64,
    abandoned: u64,
    retry_acc: f64,
    next_day_retry: Vec<u64>,
}

/// 单个子日的仿真世界
struct DayWorld {
    callers: Vec<CallerParams>,
    customers: Vec<Customer>,
    queue: VecDeque<usize>,
    free_agents: u32,
    counters: Vec<Counters>,
    control: Arc<SimControl>,
}

impl World for DayWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, sim: &mut Simulator) {
        if self.control.is_canceled() {
            sim.request_stop();
        }
    }
}

fn day_world(world: &mut dyn World) -> &mut DayWorld {
    world
        .as_any_mut()
        .downcast_mut::<DayWorld>()
        .expect("world must be DayWorld")
}

impl DayWorld {
    fn start_service(&mut self, id: usize, sim: &mut Simulator) {
        let caller = self.customers[id].caller;
        self.customers[id].status = Status::InService;
        self.free_agents -= 1;
        self.counters[caller].served += 1;
        let done_at = sim.now().after(self.callers[caller].service);
        sim.schedule(done_at, ServiceDone);
    }

    fn dispatch(&mut self, sim: &mut Simulator) {
        while self.free_agents > 0 {
            let Some(id) = self.queue.pop_front() else {
                return;
            };
            if self.customers[id].status == Status::Waiting {
                self.start_service(id, sim);
            }
        }
    }

    /// 确定性抽稀：累计概率每满 1 产生一次重试。
    fn wants_retry(&mut self, caller: usize) -> bool {
        let p = self.callers[caller].retry_probability;
        if p <= 0.0 {
            return false;
        }
        let c = &mut self.counters[caller];
        c.retry_acc += p;
        if c.retry_acc >= 1.0 - 1e-9 {
            c.retry_acc -= 1.0;
            true
        } else {
            false
        }
    }
}

/// 客户到达（新客户、重试客户或前一天遗留的排队客户）
struct Arrive {
    caller: usize,
    waited_before: u64,
    patience: SimTime,
}

impl Event for Arrive {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Arrive {
            caller,
            waited_before,
            patience,
        } = *self;
        let w = day_world(world);
        let now = sim.now();
        let id = w.customers.len();
        let deadline = now.after(patience);
        w.counters[caller].arrivals += 1;
        w.customers.push(Customer {
            caller,
            arrived: now,
            waited_before,
            deadline,
            status: Status::Waiting,
        });
        if w.free_agents > 0 {
            w.start_service(id, sim);
        } else {
            w.queue.push_back(id);
            sim.schedule(deadline, Abandon { customer: id });
        }
    }
}

/// 等待容忍时间耗尽
struct Abandon {
    customer: usize,
}

impl Event for Abandon {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = day_world(world);
        let id = self.customer;
        if w.customers[id].status != Status::Waiting {
            return;
        }
        w.customers[id].status = Status::Abandoned;
        let caller = w.customers[id].caller;
        // 只有最终放弃的客户计入 abandoned；重试客户会再次到达或进入次日。
        if !w.wants_retry(caller) {
            w.counters[caller].abandoned += 1;
            return;
        }
        let params = &w.callers[caller];
        let retry_at = sim.now().after(params.retry_delay);
        if retry_at < SimTime::END_OF_DAY {
            let patience = params.patience;
            sim.schedule(
                retry_at,
                Arrive {
                    caller,
                    waited_before: 0,
                    patience,
                },
            );
        } else {
            w.counters[caller]
                .next_day_retry
                .push(retry_at.since(SimTime::END_OF_DAY).millis());
        }
    }
}

/// 服务结束，坐席空闲
struct ServiceDone;

impl Event for ServiceDone {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = day_world(world);
        w.free_agents += 1;
        w.dispatch(sim);
    }
}

/// 在 bucket 内均匀分布 `n` 个到达时刻
fn spread(start: SimTime, span: SimTime, n: u64) -> impl Iterator<Item = SimTime> {
    (0..n).map(move |j| {
        let offset = span.millis().saturating_mul(2 * j + 1) / (2 * n.max(1));
        start.after(SimTime(offset))
    })
}

/// 仿真一个子日，返回活跃客户类型（按模型顺序）的结果；被取消时返回 `None`。
fn simulate_sub_day(
    run: &RunModel,
    k: usize,
    control: &Arc<SimControl>,
) -> Option<Vec<(String, Counters, Vec<u64>, Vec<u64>)>> {
    let model = run.model();
    let active: Vec<(usize, &CallerOverrides)> = model
        .callers
        .iter()
        .zip(run.overrides())
        .enumerate()
        .filter(|(_, (c, _))| c.active)
        .map(|(i, (_, o))| (i, o))
        .collect();

    let callers: Vec<CallerParams> = active
        .iter()
        .map(|(i, _)| {
            let c = &model.callers[*i];
            CallerParams {
                service: SimTime::from_secs_f64(c.service_secs),
                patience: SimTime::from_secs_f64(c.wait_tolerance_secs),
                retry_probability: c.retry_probability.clamp(0.0, 1.0),
                // 至少 1 毫秒，重试不会与放弃发生在同一时刻。
                retry_delay: SimTime::from_secs_f64(c.retry_delay_secs).max(MIN_RETRY_DELAY),
            }
        })
        .collect();

    let mut sim = Simulator::default();
    let mut world = DayWorld {
        counters: (0..callers.len()).map(|_| Counters::default()).collect(),
        callers,
        customers: Vec::new(),
        queue: VecDeque::new(),
        free_agents: model.agents,
        control: Arc::clone(control),
    };

    // 前一天遗留的排队客户最先入队，保持其队首位置。
    for (slot, (_, ov)) in active.iter().enumerate() {
        let waiting = ov.waiting.get(k).map(Vec::as_slice).unwrap_or(&[]);
        let tolerance = ov.tolerance.get(k).map(Vec::as_slice).unwrap_or(&[]);
        for (waited, rest) in waiting.iter().zip(tolerance) {
            sim.schedule(
                SimTime::ZERO,
                Arrive {
                    caller: slot,
                    waited_before: *waited,
                    patience: SimTime(*rest),
                },
            );
        }
    }

    for (slot, (_, ov)) in active.iter().enumerate() {
        let patience = world.callers[slot].patience;
        for at in ov.retry.get(k).into_iter().flatten() {
            if *at < DAY_MILLIS {
                sim.schedule(
                    SimTime(*at),
                    Arrive {
                        caller: slot,
                        waited_before: 0,
                        patience,
                    },
                );
            } else {
                world.counters[slot].next_day_retry.push(at - DAY_MILLIS);
            }
        }
    }

    for (slot, (i, ov)) in active.iter().enumerate() {
        let c = &model.callers[*i];
        let fresh = c.fresh_calls_mean.max(0.0).round() as u64;
        let total = fresh + ov.add.get(k).copied().unwrap_or(0);
        let span = c.arrival_profile.bucket_span();
        let patience = world.callers[slot].patience;
        for (b, n) in c.arrival_profile.allocate(total).into_iter().enumerate() {
            let start = SimTime(span.millis().saturating_mul(b as u64));
            for at in spread(start, span, n) {
                sim.schedule(
                    at,
                    Arrive {
                        caller: slot,
                        waited_before: 0,
                        patience,
                    },
                );
            }
        }
    }

    if sim.run_until(SimTime::END_OF_DAY, &mut world) == RunOutcome::Stopped {
        debug!(sub_day = k, "sub-day interrupted");
        return None;
    }
    sim.drain();

    let mut waiting: Vec<Vec<u64>> = vec![Vec::new(); world.counters.len()];
    let mut tolerance: Vec<Vec<u64>> = vec![Vec::new(); world.counters.len()];
    for id in &world.queue {
        let c = &world.customers[*id];
        if c.status != Status::Waiting {
            continue;
        }
        waiting[c.caller].push(c.waited_before + SimTime::END_OF_DAY.since(c.arrived).millis());
        tolerance[c.caller].push(c.deadline.since(SimTime::END_OF_DAY).millis());
    }

    debug!(
        sub_day = k,
        events = sim.executed(),
        customers = world.customers.len(),
        "sub-day simulated"
    );

    Some(
        active
            .iter()
            .map(|(i, _)| model.callers[*i].name.clone())
            .zip(world.counters)
            .zip(waiting.into_iter().zip(tolerance))
            .map(|((name, counters), (w, t))| (name, counters, w, t))
            .collect(),
    )
}

/// 顺序仿真运行模型的全部子日。`control` 被取消时返回 `None`。
#[tracing::instrument(skip_all, fields(model = ?run.model().name, sub_days = run.sub_day_count()))]
pub fn simulate_run_model(run: &RunModel, control: &Arc<SimControl>) -> Option<Statistics> {
    let n = run.sub_day_count();
    let mut stats = Statistics::new(run.model().name.clone(), run.model().sub_days);
    stats.customer_types = run
        .model()
        .callers
        .iter()
        .filter(|c| c.active)
        .map(|c| CustomerStats::new(c.name.clone(), n))
        .collect();

    for k in 0..n {
        if control.is_canceled() {
            return None;
        }
        let results = simulate_sub_day(run, k, control)?;
        for (slot, (_, counters, waiting, tolerance)) in results.into_iter().enumerate() {
            let out = &mut stats.customer_types[slot];
            out.arrivals[k] = counters.arrivals;
            out.served[k] = counters.served;
            out.abandoned[k] = counters.abandoned;
            out.next_day_retry[k] = counters.next_day_retry;
            out.next_day_waiting[k] = waiting;
            out.next_day_tolerance[k] = tolerance;
        }
        control.sub_day_done();
    }

    let totals = stats.totals();
    info!(
        arrivals = totals.total_arrivals(),
        served = totals.total_served(),
        abandoned = totals.total_abandoned(),
        "run model simulated"
    );
    Some(stats)
}
