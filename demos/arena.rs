use rallocator::{AllocError, ArenaAllocator, ArenaConfig};

/// Prints a labelled occupancy table.
fn dump(
  label: &str,
  allocator: &ArenaAllocator,
) {
  println!("[{}]", label);
  allocator.print_dump();
}

/// Carves blocks of shrinking size out of a fresh arena.
fn allocation(config: &ArenaConfig) -> Result<(), AllocError> {
  let mut allocator = ArenaAllocator::with_config(config)?;
  dump("allocation: empty", &allocator);

  for size in [512, 256, 128, 64, 32, 16, 8] {
    match allocator.allocate(size)? {
      Some(addr) => println!("allocate({}) -> {}", size, addr),
      None => println!("allocate({}) -> out of space", size),
    }
  }
  dump("allocation: done", &allocator);
  Ok(())
}

/// Frees blocks one by one and watches them merge back together.
fn freeing(config: &ArenaConfig) -> Result<(), AllocError> {
  let mut allocator = ArenaAllocator::with_config(config)?;

  let addrs = [
    allocator.allocate(512)?,
    allocator.allocate(256)?,
    allocator.allocate(128)?,
  ];
  dump("freeing: three blocks", &allocator);

  for addr in addrs.into_iter().flatten() {
    allocator.free(addr)?;
    dump(&format!("freeing: released {}", addr), &allocator);
  }

  let _ = allocator.allocate(500)?;
  let _ = allocator.allocate(500)?;
  dump("freeing: two 500 byte blocks", &allocator);

  allocator.reset();
  dump("freeing: reset", &allocator);
  Ok(())
}

/// Shrinks a block, grows it back in place, then forces it to move.
fn reallocation(config: &ArenaConfig) -> Result<(), AllocError> {
  let mut allocator = ArenaAllocator::with_config(config)?;

  let Some(mut loc) = allocator.allocate(200)? else {
    return Ok(());
  };
  let _ = allocator.allocate(200)?;
  dump("reallocation: two blocks", &allocator);

  for size in [20, 200, 500] {
    match allocator.resize(loc, size)? {
      Some(addr) => {
        println!("resize({}, {}) -> {}", loc, size, addr);
        loc = addr;
      }
      None => println!("resize({}, {}) -> out of space", loc, size),
    }
    dump(&format!("reallocation: resized to {}", size), &allocator);
  }
  Ok(())
}

/// Grows a block that has no free neighbours while the arena is nearly full.
fn fragmentation(config: &ArenaConfig) -> Result<(), AllocError> {
  let mut allocator = ArenaAllocator::with_config(config)?;

  let first = allocator.allocate(900)?;
  let _ = allocator.allocate(40)?;
  let third = allocator.allocate(20)?;
  dump("fragmentation: three blocks", &allocator);

  if let (Some(first), Some(third)) = (first, third) {
    allocator.free(third)?;
    match allocator.resize(first, 920)? {
      Some(addr) => println!("resize({}, 920) -> {}", first, addr),
      None => println!("resize({}, 920) -> out of space, block kept", first),
    }
  }
  dump("fragmentation: after resize", &allocator);
  Ok(())
}

fn main() {
  env_logger::init();

  let config = match ArenaConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      eprintln!("{}", e);
      std::process::exit(1);
    }
  };

  let scenarios: [(&str, fn(&ArenaConfig) -> Result<(), AllocError>); 4] = [
    ("allocation", allocation),
    ("freeing", freeing),
    ("reallocation", reallocation),
    ("fragmentation", fragmentation),
  ];

  for (name, scenario) in scenarios {
    println!("\n>>> {}", name);
    if let Err(e) = scenario(&config) {
      eprintln!("{} failed: {}", name, e);
      std::process::exit(1);
    }
  }
}
