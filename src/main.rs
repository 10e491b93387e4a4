//! Notify Dispatch CLI
//!
//! 通过模拟渠道手动分发一条通知，并打印生命周期事件

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use notify_dispatch::notification::channels::{SimulatedConfig, SimulatedSender};
use notify_dispatch::notification::{META_SUBJECT, LifecycleEventKind};
use notify_dispatch::{
    Channel, DispatcherBuilder, FnObserver, LifecycleEvent, Notification, Priority, Recipient,
    SendOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "notify")]
#[command(about = "Notify Dispatch - 多渠道通知分发")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 发送一条通知
    Send {
        /// 邮箱地址
        #[arg(long)]
        email: Option<String>,
        /// 手机号
        #[arg(long)]
        phone: Option<String>,
        /// 推送 device token
        #[arg(long)]
        device_token: Option<String>,
        /// Slack 频道
        #[arg(long)]
        slack_channel: Option<String>,
        /// 邮件主题
        #[arg(long)]
        subject: Option<String>,
        /// 指定渠道 (email/sms/push/slack)，默认自动选择
        #[arg(long, short)]
        channel: Option<Channel>,
        /// 消息内容，支持 {{name}} 占位符
        #[arg(long, short)]
        message: String,
        /// 模板变量 key=value，可重复
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
        /// 优先级 (low/normal/high/critical)
        #[arg(long, default_value = "normal")]
        priority: Priority,
        /// 最大尝试次数
        #[arg(long, default_value = "3")]
        max_attempts: u32,
        /// 重试间隔（毫秒）
        #[arg(long, default_value = "1000")]
        delay_ms: u64,
        /// 模拟前 N 次发送失败
        #[arg(long, default_value = "0")]
        fail_first: u32,
        /// 使用非阻塞分发
        #[arg(long = "async")]
        use_async: bool,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 列出可用渠道
    Channels {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn print_event(event: &LifecycleEvent, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{}", line);
        }
        return;
    }

    let channel = event.channel.map(|c| c.as_str()).unwrap_or("-");
    match &event.kind {
        LifecycleEventKind::Sent { attempt_number } => {
            println!("✅ [{}] sent via {} (attempt {})", channel, event.sender_name, attempt_number);
        }
        LifecycleEventKind::Failed { total_attempts, error } => {
            println!("❌ [{}] failed after {} attempt(s): {}", channel, total_attempts, error);
        }
        LifecycleEventKind::Retrying {
            next_attempt,
            max_attempts,
            delay_ms,
            reason,
        } => {
            println!(
                "🔄 [{}] retrying {}/{} in {}ms: {}",
                channel, next_attempt, max_attempts, delay_ms, reason
            );
        }
    }
}

fn print_outcome(outcome: &SendOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("结果:");
        println!("  ID: {}", outcome.notification_id);
        println!("  渠道: {} ({})", outcome.channel, outcome.sender_name);
        println!("  成功: {}", outcome.success);
        if let Some(error) = &outcome.error {
            println!("  错误: {}", error);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 控制日志级别，默认为 info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notify_dispatch=info,notify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            email,
            phone,
            device_token,
            slack_channel,
            subject,
            channel,
            message,
            vars,
            priority,
            max_attempts,
            delay_ms,
            fail_first,
            use_async,
            json,
        } => {
            let mut recipient = Recipient::new();
            recipient.email = email;
            recipient.phone = phone;
            if let Some(token) = device_token {
                recipient = recipient.with_device_token(token);
            }
            if let Some(target) = slack_channel {
                recipient = recipient.with_slack_channel(target);
            }
            if let Some(subject) = subject {
                recipient = recipient.with_metadata(META_SUBJECT, subject);
            }

            let mut notification = Notification::new(recipient, message).with_priority(priority);
            for (key, value) in vars {
                notification = notification.with_variable(key, value);
            }

            let mut builder = DispatcherBuilder::new()
                .max_attempts(max_attempts)
                .retry_delay(Duration::from_millis(delay_ms))
                .runtime(tokio::runtime::Handle::current())
                .observer(Arc::new(FnObserver::new(move |event: &LifecycleEvent| {
                    print_event(event, json)
                })));
            for ch in Channel::ALL {
                let mut config = SimulatedConfig::new(ch);
                config.fail_first = fail_first;
                builder = builder.sender(ch, Arc::new(SimulatedSender::new(config)));
            }
            let dispatcher = builder.build()?;
            debug!(dispatcher = ?dispatcher, "Dispatcher ready");

            let outcome = if use_async {
                dispatcher.send_async(notification, channel).await?
            } else {
                // 阻塞驱动会 sleep，放到 blocking 线程上
                tokio::task::spawn_blocking(move || dispatcher.send(&notification, channel))
                    .await
                    .map_err(|e| anyhow!("dispatch task failed: {}", e))??
            };

            print_outcome(&outcome, json)?;
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Commands::Channels { json } => {
            let channels: Vec<&str> = Channel::ALL.iter().map(|c| c.as_str()).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&channels)?);
            } else {
                println!("可用渠道（自动选择优先级从高到低）:\n");
                for channel in channels {
                    println!("  {}", channel);
                }
            }
        }
    }

    Ok(())
}
