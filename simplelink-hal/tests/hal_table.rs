//! The callback table is process wide state, so everything is checked in a single test.
use std::{
    convert::Infallible,
    ptr::{null, null_mut},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::{delay::DelayNs, digital, digital::OutputPin, spi, spi::SpiBus};
use simplelink_hal::{
    ffi::{SlIpV4AcquiredAsync_t, SlNetAppEvent_t, SlWlanEvent_t},
    hal_table::{self, *},
    Cc3100, Cc3100Config, SlError,
};
use static_cell::StaticCell;

#[derive(Default)]
struct Lines {
    cs_low: bool,
    n_hib_high: bool,
    cs_toggles: usize,
    echo: Vec<u8>,
}
type SharedLines = Arc<Mutex<Lines>>;

struct EchoSpi(SharedLines);
impl spi::ErrorType for EchoSpi {
    type Error = Infallible;
}
impl SpiBus<u8> for EchoSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let lines = self.0.lock().unwrap();
        assert!(lines.cs_low);
        for (word, echoed) in words.iter_mut().zip(lines.echo.iter()) {
            *word = *echoed;
        }
        Ok(())
    }
    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut lines = self.0.lock().unwrap();
        assert!(lines.cs_low);
        lines.echo = words.to_vec();
        Ok(())
    }
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.read(read)?;
        self.write(write)
    }
    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.read(words)
    }
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct ChipSelect(SharedLines);
impl digital::ErrorType for ChipSelect {
    type Error = Infallible;
}
impl OutputPin for ChipSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut lines = self.0.lock().unwrap();
        lines.cs_low = true;
        lines.cs_toggles += 1;
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.lock().unwrap().cs_low = false;
        Ok(())
    }
}

struct Hibernate(SharedLines);
impl digital::ErrorType for Hibernate {
    type Error = Infallible;
}
impl OutputPin for Hibernate {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.lock().unwrap().n_hib_high = false;
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.lock().unwrap().n_hib_high = true;
        Ok(())
    }
}

struct NoDelay;
impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

type Board = Cc3100<CriticalSectionRawMutex, EchoSpi, ChipSelect, Hibernate>;

fn new_board(lines: &SharedLines) -> Board {
    Cc3100::new(
        EchoSpi(lines.clone()),
        ChipSelect(lines.clone()),
        Hibernate(lines.clone()),
        &mut NoDelay,
        Cc3100Config::default(),
    )
    .unwrap()
}

static IRQ_CALLS: AtomicUsize = AtomicUsize::new(0);
extern "C" fn host_driver_irq_handler() {
    IRQ_CALLS.fetch_add(1, Ordering::Relaxed);
}

#[test]
fn callback_table_forwards_to_the_bound_driver() {
    static BOARD: StaticCell<Board> = StaticCell::new();
    static SECOND_BOARD: StaticCell<Board> = StaticCell::new();

    assert!(hal_table::bound_port().is_none());

    let lines = SharedLines::default();
    let board = install(&BOARD, new_board(&lines)).unwrap();
    assert!(hal_table::bound_port().is_some());

    // There can only be one.
    assert_eq!(
        install(&SECOND_BOARD, new_board(&lines)).err(),
        Some(SlError::AlreadyBound)
    );
    assert_eq!(bind(board), Err(SlError::AlreadyBound));

    // Power.
    slhal_DeviceEnablePreamble();
    slhal_DeviceEnable();
    assert!(lines.lock().unwrap().n_hib_high);
    slhal_DeviceDisable();
    assert!(!lines.lock().unwrap().n_hib_high);

    // Transport.
    let fd = slhal_IfOpen(null(), 0);
    assert_eq!(fd, 1);
    let toggles_before = lines.lock().unwrap().cs_toggles;
    let mut frame = [0x43, 0x21, 0x34, 0x12];
    assert_eq!(unsafe { slhal_IfWrite(fd, frame.as_ptr(), 4) }, 4);
    frame.fill(0);
    assert_eq!(unsafe { slhal_IfRead(fd, frame.as_mut_ptr(), 4) }, 4);
    assert_eq!(frame, [0x43, 0x21, 0x34, 0x12]);
    assert_eq!(unsafe { slhal_IfRead(fd, null_mut(), 4) }, -1);
    {
        let lines = lines.lock().unwrap();
        assert_eq!(lines.cs_toggles - toggles_before, 2);
        assert!(!lines.cs_low);
    }
    assert_eq!(slhal_IfClose(fd), 0);

    // Interrupts. The handler is called right from the edge, as the blocking host driver needs.
    assert_eq!(
        slhal_IfRegIntHdlr(Some(host_driver_irq_handler), null_mut()),
        0
    );
    board.on_irq_edge();
    assert_eq!(IRQ_CALLS.load(Ordering::Relaxed), 1);
    slhal_IfMaskIntHdlr();
    board.on_irq_edge();
    assert_eq!(IRQ_CALLS.load(Ordering::Relaxed), 1);
    slhal_IfUnMaskIntHdlr();
    assert_eq!(IRQ_CALLS.load(Ordering::Relaxed), 2);
    assert_eq!(board.dispatch_irq(), 0);
    assert_eq!(slhal_IfRegIntHdlr(None, null_mut()), 0);
    board.on_irq_edge();
    assert_eq!(board.dispatch_irq(), 0);
    assert_eq!(IRQ_CALLS.load(Ordering::Relaxed), 2);

    // Events.
    unsafe {
        slhal_WlanEvtHdlr(&SlWlanEvent_t { Event: 1 });
    }
    assert!(board.is_connected());
    unsafe {
        slhal_NetAppEvtHdlr(&SlNetAppEvent_t {
            Event: 1,
            ipAcquiredV4: SlIpV4AcquiredAsync_t {
                ip: 0xc0a8_0102,
                gateway: 0xc0a8_0101,
                dns: 0,
            },
        });
        slhal_NetAppEvtHdlr(null());
    }
    assert_eq!(board.ip_address().unwrap().to_string(), "192.168.1.2");
    assert_eq!(board.gateway().unwrap().to_string(), "192.168.1.1");
    assert_eq!(board.dns(), None);
    unsafe {
        slhal_WlanEvtHdlr(&SlWlanEvent_t { Event: 2 });
    }
    assert!(!board.is_connected());
}
