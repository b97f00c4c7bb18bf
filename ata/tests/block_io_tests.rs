//! Block I/O adapter tests

mod common;

use common::{controller, identify_words, SimDevice};
use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use pio_ata::{AtaBlockDevice, AtaController, AtaError, Device, Lba28, SharedBus};

fn patterned_disk(sectors: usize) -> SimDevice {
    let mut sim = SimDevice::with_disk(sectors);
    if let Some(disk) = sim.disk.as_mut() {
        for (i, b) in disk.iter_mut().enumerate() {
            *b = (i % 253) as u8;
        }
    }
    sim
}

fn expected(range: core::ops::Range<usize>) -> Vec<u8> {
    range.map(|i| (i % 253) as u8).collect()
}

#[test]
fn test_block_size() {
    let mut ata = controller(SimDevice::new());
    let dev = AtaBlockDevice::new(&mut ata, Device::Device0);
    assert_eq!(dev.block_size(), BlockSize::BS_512);
}

#[test]
fn test_read_single_block() {
    let mut ata = controller(patterned_disk(16));
    let mut dev = AtaBlockDevice::new(&mut ata, Device::Device0);

    let mut buffer = vec![0u8; 512];
    dev.read_blocks(Lba(3), &mut buffer)
        .expect("read should succeed");

    assert_eq!(buffer, expected(3 * 512..4 * 512));
}

#[test]
fn test_read_splits_at_256_sectors() {
    let mut ata = controller(patterned_disk(320));
    {
        let mut dev = AtaBlockDevice::new(&mut ata, Device::Device0);
        let mut storage = vec![0u16; 300 * 256];
        let buffer = as_bytes_mut(&mut storage);
        dev.read_blocks(Lba(10), buffer)
            .expect("read should succeed");
        assert_eq!(buffer.to_vec(), expected(10 * 512..310 * 512));
    }

    let sim = ata.into_lanes();
    assert_eq!(sim.commands(), vec![0x20, 0x20]);
    assert_eq!(sim.bursts().len(), 300);
}

#[test]
fn test_unaligned_buffer_uses_bounce() {
    let mut ata = controller(patterned_disk(8));
    let mut storage = vec![0u16; 3 * 256 + 1];
    {
        let bytes = as_bytes_mut(&mut storage);
        let window = &mut bytes[1..1 + 3 * 512];

        let mut dev = AtaBlockDevice::new(&mut ata, Device::Device0);
        dev.read_blocks(Lba(2), window)
            .expect("read should succeed");
        assert_eq!(window.to_vec(), expected(2 * 512..5 * 512));
    }

    // one command per sector through the bounce buffer
    assert_eq!(ata.into_lanes().commands(), vec![0x20, 0x20, 0x20]);
}

fn as_bytes_mut(words: &mut [u16]) -> &mut [u8] {
    let len = words.len() * 2;
    // SAFETY: u8 has no alignment or validity requirements
    unsafe { core::slice::from_raw_parts_mut(words.as_mut_ptr().cast::<u8>(), len) }
}

#[test]
fn test_write_then_read_back() {
    let mut ata = controller(SimDevice::with_disk(8));
    let mut dev = AtaBlockDevice::new(&mut ata, Device::Device0);

    let data: Vec<u8> = (0..2 * 512).map(|i| (i * 7 % 256) as u8).collect();
    dev.write_blocks(Lba(5), &data)
        .expect("write should succeed");

    let mut back = vec![0u8; 2 * 512];
    dev.read_blocks(Lba(5), &mut back)
        .expect("read should succeed");
    assert_eq!(back, data);

    let sim = ata.into_lanes();
    let disk = sim.disk.as_ref().expect("disk");
    assert_eq!(&disk[5 * 512..7 * 512], &data[..]);
    assert!(disk[..5 * 512].iter().all(|&b| b == 0));
}

#[test]
fn test_misaligned_length_rejected() {
    let mut ata = controller(SimDevice::with_disk(4));
    let mut dev = AtaBlockDevice::new(&mut ata, Device::Device0);

    let mut buffer = vec![0u8; 100];
    assert_eq!(
        dev.read_blocks(Lba(0), &mut buffer),
        Err(AtaError::BufferMisaligned)
    );
    assert_eq!(
        dev.write_blocks(Lba(0), &buffer),
        Err(AtaError::BufferMisaligned)
    );
    assert!(ata.into_lanes().commands().is_empty());
}

#[test]
fn test_lba_beyond_28_bits_rejected() {
    let mut ata = controller(SimDevice::new());
    let mut dev = AtaBlockDevice::new(&mut ata, Device::Device0);

    let mut buffer = vec![0u8; 1024];
    assert_eq!(
        dev.read_blocks(Lba(Lba28::MAX as u64), &mut buffer),
        Err(AtaError::LbaOutOfRange)
    );
    assert_eq!(
        dev.read_blocks(Lba(1 << 28), &mut buffer[..512]),
        Err(AtaError::LbaOutOfRange)
    );
    assert!(ata.into_lanes().commands().is_empty());
}

#[test]
fn test_num_blocks_is_cached() {
    let words = identify_words(&[(49, 1 << 9), (60, 0x0800), (61, 0x0001)]);
    let mut ata = controller(SimDevice::new().with_data(&words));
    {
        let mut dev = AtaBlockDevice::new(&mut ata, Device::Device0);
        assert_eq!(dev.num_blocks(), Ok(0x0001_0800));
        assert_eq!(dev.num_blocks(), Ok(0x0001_0800));
    }
    assert_eq!(ata.into_lanes().commands(), vec![0xEC]);
}

#[test]
fn test_known_num_blocks_skips_identify() {
    let mut ata = controller(SimDevice::new());
    {
        let mut dev = AtaBlockDevice::new(&mut ata, Device::Device1).with_num_blocks(42);
        assert_eq!(dev.num_blocks(), Ok(42));
    }
    assert!(ata.into_lanes().commands().is_empty());
}

#[test]
fn test_flush() {
    let mut ata = controller(SimDevice::new());
    AtaBlockDevice::new(&mut ata, Device::Device1)
        .flush()
        .expect("flush should succeed");
    assert_eq!(ata.into_lanes().commands(), vec![0xE7]);
}

#[test]
fn test_shared_bus_block_devices() {
    let bus = SharedBus::new(controller(patterned_disk(4)));

    {
        let mut dev0 = bus.block_device(Device::Device0);
        let mut dev1 = bus.block_device(Device::Device1);

        let mut a = vec![0u8; 512];
        let mut b = vec![0u8; 512];
        dev0.read_blocks(Lba(1), &mut a).expect("read should succeed");
        dev1.read_blocks(Lba(2), &mut b).expect("read should succeed");

        assert_eq!(a, expected(512..1024));
        assert_eq!(b, expected(1024..1536));
    }

    let devices: Vec<u16> = bus.with(|ata: &mut AtaController<SimDevice>| {
        ata.engine()
            .lanes()
            .register_writes()
            .into_iter()
            .filter(|(reg, _)| *reg == pio_ata::Register::Device)
            .map(|(_, v)| v)
            .collect()
    });
    assert_eq!(devices, vec![0x40, 0x50]);

    assert_eq!(bus.into_inner().into_lanes().commands(), vec![0x20, 0x20]);
}
