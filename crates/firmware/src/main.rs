//! Pneumatic Rig Controller - Main Entry Point
//!
//! Two execution contexts:
//!
//! - a high-priority interrupt executor (USART3 vector, otherwise unused)
//!   running the 1 kHz valve tick and the host command receiver
//! - thread mode running the blocking acquisition loop: wait for the sensor
//!   array, clock in a frame, service a pending tare, send telemetry
//!
//! The sensor clock train is wrapped in a critical section inside the driver,
//! so the valve tick can preempt everything else but never stretches a clock
//! high phase past the sensor's power-down threshold.

#![no_std]
#![no_main]

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::gpio::{AnyPin, Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::peripherals::{DMA1_CH5, USART1};
use embassy_stm32::time::{hz, Hertz};
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::CountingMode;
use embassy_stm32::usart::{self, Uart, UartRx};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::{Delay, Duration, Ticker};

use firmware::board::{SensorPort, ValvePwm};
use firmware::link::{self, LinkFlags};
use firmware::{AcquisitionError, Gain, Hx711Array, ValveBank, ValveCommands};
use platform::config::{self, HOST_BAUD_RATE, READY_TIMEOUT_US, VALVE_PWM_HZ, VALVE_TICK_HZ};
use protocol::{CommandAssembler, ACK_MAGIC};

use {defmt_rtt as _, panic_probe as _};

/// Gain/channel used for every sensor.
const SENSOR_GAIN: Gain = Gain::A128;

bind_interrupts!(struct Irqs {
    USART1 => usart::InterruptHandler<peripherals::USART1>;
});

static VALVE_COMMANDS: ValveCommands = ValveCommands::new();
static LINK_FLAGS: LinkFlags = LinkFlags::new();
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn USART3() {
    // SAFETY: USART3 is not enabled as a peripheral; its vector belongs to
    // EXECUTOR_HIGH, which is started on it below.
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

/// Advance every valve once per millisecond.
#[embassy_executor::task]
async fn valve_task(mut valves: ValveBank<ValvePwm>) {
    let mut ticker = Ticker::every(Duration::from_hz(u64::from(VALVE_TICK_HZ)));
    loop {
        ticker.next().await;
        if let Err(e) = valves.tick(&VALVE_COMMANDS) {
            defmt::error!("valve PWM update failed: {}", e);
        }
    }
}

/// Receive host frames byte by byte and act on them.
#[embassy_executor::task]
async fn command_task(mut rx: UartRx<'static, USART1, DMA1_CH5>) {
    let mut assembler = CommandAssembler::new();
    let mut byte = [0u8; 1];
    loop {
        match rx.read(&mut byte).await {
            Ok(()) => {
                let [b] = byte;
                if let Some(frame) = assembler.push(b) {
                    link::dispatch(frame, &VALVE_COMMANDS, &LINK_FLAGS);
                }
            }
            Err(e) => {
                defmt::warn!("host UART error: {}", defmt::Debug2Format(&e));
                assembler.reset();
            }
        }
    }
}

/// Park the core after an unrecoverable setup failure.
fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    defmt::info!("{=str} v{=str}", config::banner(), config::APP_VERSION);

    // 8 MHz HSE -> 72 MHz SYSCLK, APB1 at its 36 MHz limit
    let mut hw_config = embassy_stm32::Config::default();
    hw_config.rcc.hse = Some(Hertz(8_000_000));
    hw_config.rcc.sys_ck = Some(Hertz(72_000_000));
    hw_config.rcc.pclk1 = Some(Hertz(36_000_000));
    let p = embassy_stm32::init(hw_config);
    defmt::info!("Clocks configured");

    // -----------------------------------------------------------------------
    // Host link: USART1 remapped to PB6 (TX) / PB7 (RX). PA9 is PD_SCK.
    // -----------------------------------------------------------------------
    embassy_stm32::pac::RCC.apb2enr().modify(|w| w.set_afioen(true));
    embassy_stm32::pac::AFIO
        .mapr()
        .modify(|w| w.set_usart1_remap(true));

    let mut uart_config = usart::Config::default();
    uart_config.baudrate = HOST_BAUD_RATE;
    let uart = match Uart::new(
        p.USART1,
        p.PB7,
        p.PB6,
        Irqs,
        p.DMA1_CH4,
        p.DMA1_CH5,
        uart_config,
    ) {
        Ok(uart) => uart,
        Err(e) => {
            defmt::error!("USART1 setup failed: {}", defmt::Debug2Format(&e));
            halt();
        }
    };
    let (mut tx, rx) = uart.split();
    defmt::info!("Host link up at {=u32} baud", HOST_BAUD_RATE);

    // -----------------------------------------------------------------------
    // Valves: TIM2 CH1-4 on PA0-PA3, TIM3 CH1-4 on PA6, PA7, PB0, PB1
    // -----------------------------------------------------------------------
    let tim2 = SimplePwm::new(
        p.TIM2,
        Some(PwmPin::new_ch1(p.PA0, OutputType::PushPull)),
        Some(PwmPin::new_ch2(p.PA1, OutputType::PushPull)),
        Some(PwmPin::new_ch3(p.PA2, OutputType::PushPull)),
        Some(PwmPin::new_ch4(p.PA3, OutputType::PushPull)),
        hz(VALVE_PWM_HZ),
        CountingMode::EdgeAlignedUp,
    );
    let tim3 = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new_ch1(p.PA6, OutputType::PushPull)),
        Some(PwmPin::new_ch2(p.PA7, OutputType::PushPull)),
        Some(PwmPin::new_ch3(p.PB0, OutputType::PushPull)),
        Some(PwmPin::new_ch4(p.PB1, OutputType::PushPull)),
        hz(VALVE_PWM_HZ),
        CountingMode::EdgeAlignedUp,
    );
    let mut valves = ValveBank::new(ValvePwm::new(tim2, tim3));
    if let Err(e) = valves.init() {
        defmt::error!("valve bank init failed: {}", e);
        halt();
    }

    // Valve tick and command receiver preempt the acquisition loop.
    interrupt::USART3.set_priority(Priority::P6);
    let high = EXECUTOR_HIGH.start(interrupt::USART3);
    if let Err(e) = high.spawn(valve_task(valves)) {
        defmt::error!("valve task spawn failed: {}", defmt::Debug2Format(&e));
        halt();
    }
    if let Err(e) = high.spawn(command_task(rx)) {
        defmt::error!("command task spawn failed: {}", defmt::Debug2Format(&e));
        halt();
    }
    defmt::info!("Valve tick at {=u32} Hz, command receiver running", VALVE_TICK_HZ);

    // -----------------------------------------------------------------------
    // Sensor array: PD_SCK on PA9, DOUT0-7 on PB8-PB15
    // -----------------------------------------------------------------------
    let clock: Output<'static, AnyPin> = Output::new(p.PA9, Level::Low, Speed::Low).degrade();
    let port = SensorPort::new([
        Input::new(p.PB8, Pull::Up).degrade(),
        Input::new(p.PB9, Pull::Up).degrade(),
        Input::new(p.PB10, Pull::Up).degrade(),
        Input::new(p.PB11, Pull::Up).degrade(),
        Input::new(p.PB12, Pull::Up).degrade(),
        Input::new(p.PB13, Pull::Up).degrade(),
        Input::new(p.PB14, Pull::Up).degrade(),
        Input::new(p.PB15, Pull::Up).degrade(),
    ]);

    defmt::info!("Waiting for first sensor conversion...");
    let mut array = match Hx711Array::new(clock, port, SENSOR_GAIN) {
        Ok(array) => array,
        Err(e) => {
            defmt::error!("sensor array init failed: {}", e);
            halt();
        }
    };
    defmt::info!("Sensor array ready, gain {}", SENSOR_GAIN);

    // -----------------------------------------------------------------------
    // Acquisition loop
    // -----------------------------------------------------------------------
    let mut delay = Delay;
    loop {
        match array.read_with_timeout(&mut delay, READY_TIMEOUT_US) {
            Ok(()) => {
                match link::service_tare(&mut array, &LINK_FLAGS, &mut delay, READY_TIMEOUT_US) {
                    Ok(true) => defmt::info!("tare complete"),
                    Ok(false) => {}
                    Err(e) => defmt::error!("tare failed: {}", e),
                }

                let frame = link::telemetry(array.kpa_all(), &VALVE_COMMANDS);
                if let Err(e) = tx.blocking_write(&frame.encode()) {
                    defmt::warn!("telemetry write failed: {}", defmt::Debug2Format(&e));
                }
            }
            // Logged by the driver; keep serving acknowledgements.
            Err(AcquisitionError::Timeout) => {}
            Err(AcquisitionError::Pin(never)) => match never {},
        }

        // Valve acknowledgements must not wait on a stalled sensor.
        if LINK_FLAGS.take_ack() {
            if let Err(e) = tx.blocking_write(&ACK_MAGIC) {
                defmt::warn!("ACK write failed: {}", defmt::Debug2Format(&e));
            }
        }
    }
}
