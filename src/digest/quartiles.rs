//! Quartile selection over the first 128 bucket counters.
//!
//! The three order statistics are found with a quickselect that computes
//! the median first and remembers the partition boundaries it crossed;
//! those boundaries then bracket the searches for q1 and q3 so neither
//! restarts from the full range. Cheaper than three independent selections
//! and much cheaper than a sort.

pub(crate) const EFF_BUCKETS: usize = 128;

/// The values at order-statistic positions 31, 63 and 95 of the first 128
/// buckets.
pub(crate) fn quartile_points(buckets: &[u64]) -> (u64, u64, u64) {
    let p1 = EFF_BUCKETS / 4 - 1;
    let p2 = EFF_BUCKETS / 2 - 1;
    let p3 = EFF_BUCKETS - EFF_BUCKETS / 4 - 1;
    let end = EFF_BUCKETS - 1;

    let mut buf = [0u64; EFF_BUCKETS];
    buf.copy_from_slice(&buckets[..EFF_BUCKETS]);

    let mut shortcut_left = [0usize; EFF_BUCKETS];
    let mut shortcut_right = [0usize; EFF_BUCKETS];
    let mut spl = 0;
    let mut spr = 0;

    let mut q1 = 0;
    let q2;
    let mut q3 = 0;

    let mut l = 0;
    let mut r = end;
    loop {
        let ret = partition(&mut buf, l, r);
        if ret > p2 {
            r = ret - 1;
            shortcut_right[spr] = ret;
            spr += 1;
        } else if ret < p2 {
            l = ret + 1;
            shortcut_left[spl] = ret;
            spl += 1;
        } else {
            q2 = buf[p2];
            break;
        }
    }

    shortcut_left[spl] = p2 - 1;
    shortcut_right[spr] = p2 + 1;

    let mut l = 0;
    for i in 0..=spl {
        let mut r = shortcut_left[i];
        if r > p1 {
            loop {
                let ret = partition(&mut buf, l, r);
                if ret > p1 {
                    r = ret - 1;
                } else if ret < p1 {
                    l = ret + 1;
                } else {
                    q1 = buf[p1];
                    break;
                }
            }
            break;
        } else if r < p1 {
            l = r;
        } else {
            q1 = buf[p1];
            break;
        }
    }

    let mut r = end;
    for i in 0..=spr {
        let mut l = shortcut_right[i];
        if l < p3 {
            loop {
                let ret = partition(&mut buf, l, r);
                if ret > p3 {
                    r = ret - 1;
                } else if ret < p3 {
                    l = ret + 1;
                } else {
                    q3 = buf[p3];
                    break;
                }
            }
            break;
        } else if l > p3 {
            r = l;
        } else {
            q3 = buf[p3];
            break;
        }
    }

    (q1, q2, q3)
}

/// Partition `buf[left..=right]` around its midpoint value and return the
/// pivot's final position. A two-element range is ordered in place.
fn partition(buf: &mut [u64], left: usize, right: usize) -> usize {
    if left == right {
        return left;
    }
    if left + 1 == right {
        if buf[left] > buf[right] {
            buf.swap(left, right);
        }
        return left;
    }

    let mut ret = left;
    let pivot = (left + right) >> 1;
    let val = buf[pivot];

    buf[pivot] = buf[right];
    buf[right] = val;

    for i in left..right {
        if buf[i] < val {
            buf.swap(i, ret);
            ret += 1;
        }
    }

    buf[right] = buf[ret];
    buf[ret] = val;

    ret
}
